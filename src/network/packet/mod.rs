pub mod ipv4;
pub mod ipv6;
pub mod tcp;
pub mod udp;
pub mod icmp;

use crate::network::packet::icmp::{ICMPHeader, ICMPv6Header};
use crate::network::packet::ipv4::IPv4Header;
use crate::network::packet::ipv6::IPv6Header;
use crate::network::packet::tcp::TCPHeader;
use crate::network::packet::udp::UDPHeader;

pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;
pub const IPPROTO_ICMPV6: u8 = 58;

/// 迂回ドライバから受け取ったネットワーク層パケットの解析結果
///
/// ネットワーク層はどちらか一方、トランスポート層は高々一つだけが埋まる。
/// `raw` は IP ヘッダー先頭から始まる元のバッファを指す。
#[derive(Debug, Clone)]
pub struct ParsedPacket<'a> {
    pub raw: &'a [u8],
    pub ipv4: Option<IPv4Header>,
    pub ipv6: Option<IPv6Header>,
    pub icmp: Option<ICMPHeader>,
    pub icmpv6: Option<ICMPv6Header>,
    pub tcp: Option<TCPHeader>,
    pub udp: Option<UDPHeader>,
    pub payload_len: usize,
}

impl<'a> ParsedPacket<'a> {
    pub fn parse(data: &'a [u8]) -> Self {
        let mut parsed = Self {
            raw: data,
            ipv4: None,
            ipv6: None,
            icmp: None,
            icmpv6: None,
            tcp: None,
            udp: None,
            payload_len: 0,
        };

        // ネットワーク層のパース
        let (protocol, transport_data) = match data.first().map(|b| b >> 4) {
            Some(4) => match IPv4Header::parse(data) {
                Some((ipv4, remainder)) => {
                    let later_fragment = ipv4.is_later_fragment();
                    let protocol = ipv4.protocol;
                    parsed.ipv4 = Some(ipv4);
                    // 後続フラグメントの先頭はアプリケーションのデータ
                    if later_fragment {
                        parsed.payload_len = remainder.len();
                        return parsed;
                    }
                    (protocol, remainder)
                }
                None => return parsed,
            },
            Some(6) => match IPv6Header::parse(data) {
                Some((ipv6, remainder)) => {
                    let upper = ipv6.upper_layer(remainder);
                    parsed.ipv6 = Some(ipv6);
                    match upper {
                        Some(upper) => upper,
                        None => return parsed,
                    }
                }
                None => return parsed,
            },
            _ => return parsed,
        };

        // トランスポート層のパース
        let payload = match protocol {
            IPPROTO_TCP => TCPHeader::parse(transport_data).map(|(tcp, payload)| {
                parsed.tcp = Some(tcp);
                payload
            }),
            IPPROTO_UDP => UDPHeader::parse(transport_data).map(|(udp, payload)| {
                parsed.udp = Some(udp);
                payload
            }),
            IPPROTO_ICMP if parsed.ipv4.is_some() => {
                ICMPHeader::parse(transport_data).map(|(icmp, payload)| {
                    parsed.icmp = Some(icmp);
                    payload
                })
            }
            IPPROTO_ICMPV6 if parsed.ipv6.is_some() => {
                ICMPv6Header::parse(transport_data).map(|(icmpv6, payload)| {
                    parsed.icmpv6 = Some(icmpv6);
                    payload
                })
            }
            _ => Some(transport_data),
        };

        parsed.payload_len = payload.map_or(0, <[u8]>::len);
        parsed
    }

    pub fn has_network_header(&self) -> bool {
        self.ipv4.is_some() || self.ipv6.is_some()
    }
}
