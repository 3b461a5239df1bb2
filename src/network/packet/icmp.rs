pub const ICMP_HEADER_LEN: usize = 8;

/// ICMP と ICMPv6 は先頭 8 バイトの形が同じなので共用する
#[derive(Debug, Clone)]
pub struct ICMPHeader {
    pub icmp_type: u8,
    pub icmp_code: u8,
}

pub type ICMPv6Header = ICMPHeader;

impl ICMPHeader {
    pub fn parse(data: &[u8]) -> Option<(Self, &[u8])> {
        if data.len() < ICMP_HEADER_LEN {
            return None;
        }

        Some((
            Self {
                icmp_type: data[0],
                icmp_code: data[1],
            },
            &data[ICMP_HEADER_LEN..],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_type_and_code() {
        let data = [3, 3, 0xab, 0xcd, 0, 0, 0, 0, 0x45];
        let (icmp, rest) = ICMPHeader::parse(&data).unwrap();
        assert_eq!((icmp.icmp_type, icmp.icmp_code), (3, 3));
        assert_eq!(rest, &[0x45]);
        assert!(ICMPHeader::parse(&data[..4]).is_none());
    }
}
