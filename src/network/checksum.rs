use crate::core::error::{DivertError, DivertResult};
use crate::network::packet::ipv4::IPV4_HEADER_LEN;
use crate::network::packet::ipv6::IPV6_HEADER_LEN;
use crate::network::packet::{IPPROTO_ICMP, IPPROTO_ICMPV6, IPPROTO_TCP, IPPROTO_UDP};
use pnet::packet::icmp::{self, MutableIcmpPacket};
use pnet::packet::icmpv6::{self, MutableIcmpv6Packet};
use pnet::packet::ipv4::{self, Ipv4Packet, MutableIpv4Packet};
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::{self, MutableTcpPacket};
use pnet::packet::udp::{self, MutableUdpPacket};

/// IP 層とその上のチェックサムを再計算する
///
/// バッファは IP ヘッダーから始まり、長さフィールドが示す範囲までが対象。
/// IPv6 の拡張ヘッダーは扱わない。
pub fn calc_checksums(packet: &mut [u8]) -> DivertResult<()> {
    match packet.first().map(|b| b >> 4) {
        Some(4) => ipv4_checksums(packet),
        Some(6) => ipv6_checksums(packet),
        _ => Err(DivertError::Build("IP バージョンが不正です")),
    }
}

fn ipv4_checksums(packet: &mut [u8]) -> DivertResult<()> {
    let (header_len, total_len, protocol, source, destination) = {
        let ip = Ipv4Packet::new(packet).ok_or(DivertError::Build("IPv4 ヘッダーが短すぎます"))?;
        (
            ip.get_header_length() as usize * 4,
            ip.get_total_length() as usize,
            ip.get_next_level_protocol().0,
            ip.get_source(),
            ip.get_destination(),
        )
    };
    if header_len < IPV4_HEADER_LEN || total_len < header_len || total_len > packet.len() {
        return Err(DivertError::Build("IPv4 の長さフィールドが不正です"));
    }

    let (header, transport) = packet[..total_len].split_at_mut(header_len);
    match protocol {
        IPPROTO_TCP => {
            let mut tcp = MutableTcpPacket::new(transport).ok_or(DivertError::Build("TCP ヘッダーが短すぎます"))?;
            let checksum = tcp::ipv4_checksum(&tcp.to_immutable(), &source, &destination);
            tcp.set_checksum(checksum);
        }
        IPPROTO_UDP => {
            let mut udp = MutableUdpPacket::new(transport).ok_or(DivertError::Build("UDP ヘッダーが短すぎます"))?;
            let checksum = udp::ipv4_checksum(&udp.to_immutable(), &source, &destination);
            udp.set_checksum(checksum);
        }
        IPPROTO_ICMP => {
            let mut icmp = MutableIcmpPacket::new(transport).ok_or(DivertError::Build("ICMP ヘッダーが短すぎます"))?;
            let checksum = icmp::checksum(&icmp.to_immutable());
            icmp.set_checksum(checksum);
        }
        _ => {}
    }

    let mut ip = MutableIpv4Packet::new(header).ok_or(DivertError::Build("IPv4 ヘッダーが短すぎます"))?;
    let checksum = ipv4::checksum(&ip.to_immutable());
    ip.set_checksum(checksum);

    Ok(())
}

fn ipv6_checksums(packet: &mut [u8]) -> DivertResult<()> {
    let (end, next_header, source, destination) = {
        let ip = Ipv6Packet::new(packet).ok_or(DivertError::Build("IPv6 ヘッダーが短すぎます"))?;
        (
            IPV6_HEADER_LEN + ip.get_payload_length() as usize,
            ip.get_next_header().0,
            ip.get_source(),
            ip.get_destination(),
        )
    };
    if end > packet.len() {
        return Err(DivertError::Build("IPv6 の長さフィールドが不正です"));
    }

    let transport = &mut packet[IPV6_HEADER_LEN..end];
    match next_header {
        IPPROTO_TCP => {
            let mut tcp = MutableTcpPacket::new(transport).ok_or(DivertError::Build("TCP ヘッダーが短すぎます"))?;
            let checksum = tcp::ipv6_checksum(&tcp.to_immutable(), &source, &destination);
            tcp.set_checksum(checksum);
        }
        IPPROTO_UDP => {
            let mut udp = MutableUdpPacket::new(transport).ok_or(DivertError::Build("UDP ヘッダーが短すぎます"))?;
            let checksum = udp::ipv6_checksum(&udp.to_immutable(), &source, &destination);
            udp.set_checksum(checksum);
        }
        IPPROTO_ICMPV6 => {
            let mut icmpv6 = MutableIcmpv6Packet::new(transport).ok_or(DivertError::Build("ICMPv6 ヘッダーが短すぎます"))?;
            let checksum = icmpv6::checksum(&icmpv6.to_immutable(), &source, &destination);
            icmpv6.set_checksum(checksum);
        }
        _ => {}
    }

    Ok(())
}
