use std::net::Ipv4Addr;

pub const IPV4_HEADER_LEN: usize = 20;

// 0                   1                   2                   3
// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |Version|  IHL  |Type of Service|          Total Length         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |         Identification        |Flags|      Fragment Offset    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Time to Live |    Protocol   |         Header Checksum       |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                       Source Address                          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Destination Address                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone)]
pub struct IPv4Header {
    pub ihl: u8,
    pub total_length: u16,
    pub fragment_offset: u16,
    pub protocol: u8,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl IPv4Header {
    /// ヘッダー長 (バイト)
    pub fn header_len(&self) -> usize {
        self.ihl as usize * 4
    }

    /// 先頭以外のフラグメントはトランスポートヘッダーを持たない
    pub fn is_later_fragment(&self) -> bool {
        self.fragment_offset != 0
    }

    /// ヘッダーと、Total Length で切り詰めたペイロードを返す
    pub fn parse(data: &[u8]) -> Option<(Self, &[u8])> {
        if data.len() < IPV4_HEADER_LEN {
            return None;
        }

        let version = (data[0] >> 4) & 0xf;
        let ihl = data[0] & 0xf;
        if version != 4 || ihl < 5 {
            return None;
        }

        let header_len = ihl as usize * 4;
        let total_length = u16::from_be_bytes([data[2], data[3]]);
        if data.len() < header_len || (total_length as usize) < header_len {
            return None;
        }
        // リンク層のパディングはペイロードに含めない
        let end = data.len().min(total_length as usize);

        let fragment_offset = u16::from_be_bytes([data[6] & 0x1f, data[7]]);
        let protocol = data[9];
        let source = Ipv4Addr::new(data[12], data[13], data[14], data[15]);
        let destination = Ipv4Addr::new(data[16], data[17], data[18], data[19]);

        Some((
            Self {
                ihl,
                total_length,
                fragment_offset,
                protocol,
                source,
                destination,
            },
            &data[header_len..end],
        ))
    }
}
