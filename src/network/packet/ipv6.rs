use std::net::Ipv6Addr;

pub const IPV6_HEADER_LEN: usize = 40;

const HOP_BY_HOP: u8 = 0;
const ROUTING: u8 = 43;
const FRAGMENT: u8 = 44;
const DESTINATION_OPTIONS: u8 = 60;

#[derive(Debug, Clone)]
pub struct IPv6Header {
    pub payload_length: u16,
    pub next_header: u8,
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
}

impl IPv6Header {
    /// ヘッダーと、Payload Length で切り詰めたペイロードを返す
    pub fn parse(data: &[u8]) -> Option<(Self, &[u8])> {
        if data.len() < IPV6_HEADER_LEN {
            return None;
        }

        if data[0] >> 4 != 6 {
            return None;
        }

        let payload_length = u16::from_be_bytes([data[4], data[5]]);
        let next_header = data[6];

        let mut source_bytes = [0u8; 16];
        source_bytes.copy_from_slice(&data[8..24]);
        let source = Ipv6Addr::from(source_bytes);

        let mut dest_bytes = [0u8; 16];
        dest_bytes.copy_from_slice(&data[24..40]);
        let destination = Ipv6Addr::from(dest_bytes);

        let end = data.len().min(IPV6_HEADER_LEN + payload_length as usize);

        Some((
            Self {
                payload_length,
                next_header,
                source,
                destination,
            },
            &data[IPV6_HEADER_LEN..end],
        ))
    }

    /// 拡張ヘッダーを読み飛ばし、上位層のプロトコル番号とデータを返す
    ///
    /// 先頭以外のフラグメントでは上位層ヘッダーがないので、Fragment (44) と
    /// その後ろのデータを返す。
    pub fn upper_layer<'a>(&self, payload: &'a [u8]) -> Option<(u8, &'a [u8])> {
        let mut next_header = self.next_header;
        let mut rest = payload;

        loop {
            let len = match next_header {
                HOP_BY_HOP | ROUTING | DESTINATION_OPTIONS => {
                    if rest.len() < 2 {
                        return None;
                    }
                    (rest[1] as usize + 1) * 8
                }
                FRAGMENT => 8,
                _ => return Some((next_header, rest)),
            };
            if rest.len() < len {
                return None;
            }
            if next_header == FRAGMENT && u16::from_be_bytes([rest[2], rest[3]]) >> 3 != 0 {
                return Some((FRAGMENT, &rest[len..]));
            }
            next_header = rest[0];
            rest = &rest[len..];
        }
    }
}
