//! 拒否応答のテンプレート
//!
//! 起動時に一度だけ固定フィールドを書き込み、以降はパケットごとに
//! 元パケットから導出するフィールドだけを上書きして再利用する。
//! 上書きするフィールドは各型のドキュメントに列挙している。

use crate::core::error::{DivertError, DivertResult};
use crate::network::checksum::calc_checksums;
use crate::network::divert::{DivertAddress, Direction};
use crate::network::packet::icmp::ICMP_HEADER_LEN;
use crate::network::packet::ipv4::{IPv4Header, IPV4_HEADER_LEN};
use crate::network::packet::ipv6::{IPv6Header, IPV6_HEADER_LEN};
use crate::network::packet::tcp::{TCPHeader, TCP_HEADER_LEN};
use pnet::packet::icmp::{IcmpCode, IcmpType, MutableIcmpPacket};
use pnet::packet::icmpv6::{Icmpv6Code, Icmpv6Type, MutableIcmpv6Packet};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::MutableIpv4Packet;
use pnet::packet::ipv6::MutableIpv6Packet;
use pnet::packet::tcp::{MutableTcpPacket, TcpFlags};

pub const IPV4_IDENTIFICATION: u16 = 0xDEAD;
pub const DEFAULT_TTL: u8 = 64;

pub const ICMP_DEST_UNREACHABLE: u8 = 3;
pub const ICMP_PORT_UNREACHABLE: u8 = 3;
pub const ICMPV6_DEST_UNREACHABLE: u8 = 1;
pub const ICMPV6_PORT_UNREACHABLE: u8 = 4;

/// IPv4 で引用する元パケットの最大長 (オプション付き最大ヘッダー + 8 バイト)
pub const ICMP_QUOTE_MAX: usize = 0x0F * 4 + 8;
/// IPv6 で引用する元パケットの長さ (IPv6 ヘッダー + TCP ヘッダー分)
pub const ICMPV6_QUOTE_LEN: usize = IPV6_HEADER_LEN + TCP_HEADER_LEN;

pub const TCP_RESET_V4_LEN: usize = IPV4_HEADER_LEN + TCP_HEADER_LEN;
pub const ICMP_UNREACHABLE_V4_CAPACITY: usize = IPV4_HEADER_LEN + ICMP_HEADER_LEN + ICMP_QUOTE_MAX;
pub const TCP_RESET_V6_LEN: usize = IPV6_HEADER_LEN + TCP_HEADER_LEN;
pub const ICMPV6_UNREACHABLE_LEN: usize = IPV6_HEADER_LEN + ICMP_HEADER_LEN + ICMPV6_QUOTE_LEN;

const TEMPLATE_ERROR: DivertError = DivertError::Build("テンプレートのサイズが不正です");

/// RST の SEQ / ACK 番号
///
/// SEQ は元パケットが ACK を持つならその確認応答番号、なければ 0。
/// ACK は SYN なら SEQ + 1、それ以外は SEQ + ペイロード長。
pub fn reset_numbers(tcp: &TCPHeader, payload_len: usize) -> (u32, u32) {
    let sequence = if tcp.flags.ack { tcp.acknowledgment_number } else { 0 };
    let acknowledgement = if tcp.flags.syn {
        tcp.sequence_number.wrapping_add(1)
    } else {
        tcp.sequence_number.wrapping_add(payload_len as u32)
    };
    (sequence, acknowledgement)
}

fn init_ipv4(buffer: &mut [u8], protocol: IpNextHeaderProtocol) -> DivertResult<()> {
    let mut ip = MutableIpv4Packet::new(buffer).ok_or(TEMPLATE_ERROR)?;
    ip.set_version(4);
    ip.set_header_length((IPV4_HEADER_LEN / 4) as u8);
    ip.set_identification(IPV4_IDENTIFICATION);
    ip.set_ttl(DEFAULT_TTL);
    ip.set_next_level_protocol(protocol);
    Ok(())
}

fn init_ipv6(buffer: &mut [u8], next_header: IpNextHeaderProtocol, payload_length: usize) -> DivertResult<()> {
    let mut ip = MutableIpv6Packet::new(buffer).ok_or(TEMPLATE_ERROR)?;
    ip.set_version(6);
    ip.set_hop_limit(DEFAULT_TTL);
    ip.set_next_header(next_header);
    ip.set_payload_length(payload_length as u16);
    Ok(())
}

fn init_reset(buffer: &mut [u8]) -> DivertResult<()> {
    let mut tcp = MutableTcpPacket::new(buffer).ok_or(TEMPLATE_ERROR)?;
    tcp.set_data_offset((TCP_HEADER_LEN / 4) as u8);
    tcp.set_flags(TcpFlags::RST | TcpFlags::ACK);
    Ok(())
}

fn patch_reset(buffer: &mut [u8], tcp: &TCPHeader, payload_len: usize) -> DivertResult<()> {
    let (sequence, acknowledgement) = reset_numbers(tcp, payload_len);
    let mut reset = MutableTcpPacket::new(buffer).ok_or(TEMPLATE_ERROR)?;
    reset.set_source(tcp.destination_port);
    reset.set_destination(tcp.source_port);
    reset.set_sequence(sequence);
    reset.set_acknowledgement(acknowledgement);
    Ok(())
}

/// 引用領域を元パケットの先頭で埋め、残りをゼロにする
fn fill_quote(area: &mut [u8], original: &[u8]) -> usize {
    let len = area.len().min(original.len());
    area[..len].copy_from_slice(&original[..len]);
    area[len..].fill(0);
    len
}

/// IPv4 TCP RST/ACK
///
/// パケットごとに上書きするフィールド: 迂回アドレス (インターフェース、
/// サブインターフェース、方向の反転)、送信元/宛先アドレス、送信元/宛先
/// ポート、SEQ、ACK、IP と TCP のチェックサム。
pub struct TcpResetV4 {
    address: DivertAddress,
    buffer: [u8; TCP_RESET_V4_LEN],
}

impl TcpResetV4 {
    pub fn new() -> DivertResult<Self> {
        let mut buffer = [0u8; TCP_RESET_V4_LEN];
        let (ip, tcp) = buffer.split_at_mut(IPV4_HEADER_LEN);
        init_ipv4(ip, IpNextHeaderProtocols::Tcp)?;
        MutableIpv4Packet::new(ip)
            .ok_or(TEMPLATE_ERROR)?
            .set_total_length(TCP_RESET_V4_LEN as u16);
        init_reset(tcp)?;

        Ok(Self {
            address: DivertAddress::default(),
            buffer,
        })
    }

    pub fn patch(
        &mut self,
        original: &DivertAddress,
        ip: &IPv4Header,
        tcp: &TCPHeader,
        payload_len: usize,
    ) -> DivertResult<()> {
        self.address = DivertAddress {
            if_idx: original.if_idx,
            sub_if_idx: original.sub_if_idx,
            direction: original.direction.reversed(),
        };

        let (header, segment) = self.buffer.split_at_mut(IPV4_HEADER_LEN);
        let mut reply = MutableIpv4Packet::new(header).ok_or(TEMPLATE_ERROR)?;
        reply.set_source(ip.destination);
        reply.set_destination(ip.source);
        patch_reset(segment, tcp, payload_len)?;

        calc_checksums(&mut self.buffer)
    }

    pub fn address(&self) -> &DivertAddress {
        &self.address
    }

    pub fn packet(&self) -> &[u8] {
        &self.buffer
    }
}

/// IPv4 ICMP Destination Unreachable (Port Unreachable)
///
/// パケットごとに上書きするフィールド: 迂回アドレス (インターフェース、
/// サブインターフェース、方向は常に Outbound)、Total Length、送信元/宛先
/// アドレス、引用領域の全体 (引用長を超える部分はゼロ)、IP と ICMP の
/// チェックサム。
pub struct IcmpUnreachableV4 {
    address: DivertAddress,
    buffer: [u8; ICMP_UNREACHABLE_V4_CAPACITY],
    length: usize,
}

impl IcmpUnreachableV4 {
    const QUOTE_OFFSET: usize = IPV4_HEADER_LEN + ICMP_HEADER_LEN;

    pub fn new() -> DivertResult<Self> {
        let mut buffer = [0u8; ICMP_UNREACHABLE_V4_CAPACITY];
        let (ip, icmp) = buffer.split_at_mut(IPV4_HEADER_LEN);
        init_ipv4(ip, IpNextHeaderProtocols::Icmp)?;
        let mut icmp = MutableIcmpPacket::new(icmp).ok_or(TEMPLATE_ERROR)?;
        icmp.set_icmp_type(IcmpType::new(ICMP_DEST_UNREACHABLE));
        icmp.set_icmp_code(IcmpCode::new(ICMP_PORT_UNREACHABLE));

        Ok(Self {
            address: DivertAddress::default(),
            buffer,
            length: Self::QUOTE_OFFSET,
        })
    }

    /// `raw` は元パケットの IP ヘッダー先頭からのバイト列
    pub fn patch(&mut self, original: &DivertAddress, ip: &IPv4Header, raw: &[u8]) -> DivertResult<()> {
        // WFP は一部の ICMP エラーの INBOUND 注入に対応していないため常に OUTBOUND
        self.address = DivertAddress {
            if_idx: original.if_idx,
            sub_if_idx: original.sub_if_idx,
            direction: Direction::Outbound,
        };

        // 元の IP ヘッダー + 8 バイト。キャプチャ長を超えては引用しない
        let wanted = (ip.header_len() + 8).min(ip.total_length as usize);
        let available = &raw[..raw.len().min(wanted)];
        let quoted = fill_quote(&mut self.buffer[Self::QUOTE_OFFSET..], available);
        self.length = Self::QUOTE_OFFSET + quoted;

        let mut reply = MutableIpv4Packet::new(&mut self.buffer[..IPV4_HEADER_LEN]).ok_or(TEMPLATE_ERROR)?;
        reply.set_total_length(self.length as u16);
        reply.set_source(ip.destination);
        reply.set_destination(ip.source);

        calc_checksums(&mut self.buffer[..self.length])
    }

    pub fn address(&self) -> &DivertAddress {
        &self.address
    }

    pub fn packet(&self) -> &[u8] {
        &self.buffer[..self.length]
    }
}

/// IPv6 TCP RST/ACK
///
/// パケットごとに上書きするフィールド: 迂回アドレス (インターフェース、
/// サブインターフェース、方向の反転)、送信元/宛先アドレス、送信元/宛先
/// ポート、SEQ、ACK、TCP のチェックサム。
pub struct TcpResetV6 {
    address: DivertAddress,
    buffer: [u8; TCP_RESET_V6_LEN],
}

impl TcpResetV6 {
    pub fn new() -> DivertResult<Self> {
        let mut buffer = [0u8; TCP_RESET_V6_LEN];
        let (ip, tcp) = buffer.split_at_mut(IPV6_HEADER_LEN);
        init_ipv6(ip, IpNextHeaderProtocols::Tcp, TCP_HEADER_LEN)?;
        init_reset(tcp)?;

        Ok(Self {
            address: DivertAddress::default(),
            buffer,
        })
    }

    pub fn patch(
        &mut self,
        original: &DivertAddress,
        ip: &IPv6Header,
        tcp: &TCPHeader,
        payload_len: usize,
    ) -> DivertResult<()> {
        self.address = DivertAddress {
            if_idx: original.if_idx,
            sub_if_idx: original.sub_if_idx,
            direction: original.direction.reversed(),
        };

        let (header, segment) = self.buffer.split_at_mut(IPV6_HEADER_LEN);
        let mut reply = MutableIpv6Packet::new(header).ok_or(TEMPLATE_ERROR)?;
        reply.set_source(ip.destination);
        reply.set_destination(ip.source);
        patch_reset(segment, tcp, payload_len)?;

        calc_checksums(&mut self.buffer)
    }

    pub fn address(&self) -> &DivertAddress {
        &self.address
    }

    pub fn packet(&self) -> &[u8] {
        &self.buffer
    }
}

/// IPv6 ICMPv6 Destination Unreachable (Port Unreachable)
///
/// 引用領域は固定長で、Payload Length は初期化時に決まる。
/// パケットごとに上書きするフィールド: 迂回アドレス (インターフェース、
/// サブインターフェース、方向は常に Outbound)、送信元/宛先アドレス、
/// 引用領域の全体 (キャプチャ長に満たない部分はゼロ)、ICMPv6 のチェックサム。
pub struct Icmpv6UnreachableV6 {
    address: DivertAddress,
    buffer: [u8; ICMPV6_UNREACHABLE_LEN],
}

impl Icmpv6UnreachableV6 {
    const QUOTE_OFFSET: usize = IPV6_HEADER_LEN + ICMP_HEADER_LEN;

    pub fn new() -> DivertResult<Self> {
        let mut buffer = [0u8; ICMPV6_UNREACHABLE_LEN];
        let (ip, icmpv6) = buffer.split_at_mut(IPV6_HEADER_LEN);
        init_ipv6(ip, IpNextHeaderProtocols::Icmpv6, ICMP_HEADER_LEN + ICMPV6_QUOTE_LEN)?;
        let mut icmpv6 = MutableIcmpv6Packet::new(icmpv6).ok_or(TEMPLATE_ERROR)?;
        icmpv6.set_icmpv6_type(Icmpv6Type::new(ICMPV6_DEST_UNREACHABLE));
        icmpv6.set_icmpv6_code(Icmpv6Code::new(ICMPV6_PORT_UNREACHABLE));

        Ok(Self {
            address: DivertAddress::default(),
            buffer,
        })
    }

    /// `raw` は元パケットの IPv6 ヘッダー先頭からのバイト列
    pub fn patch(&mut self, original: &DivertAddress, ip: &IPv6Header, raw: &[u8]) -> DivertResult<()> {
        self.address = DivertAddress {
            if_idx: original.if_idx,
            sub_if_idx: original.sub_if_idx,
            direction: Direction::Outbound,
        };

        let captured = raw.len().min(IPV6_HEADER_LEN + ip.payload_length as usize);
        fill_quote(&mut self.buffer[Self::QUOTE_OFFSET..], &raw[..captured]);

        let mut reply = MutableIpv6Packet::new(&mut self.buffer[..IPV6_HEADER_LEN]).ok_or(TEMPLATE_ERROR)?;
        reply.set_source(ip.destination);
        reply.set_destination(ip.source);

        calc_checksums(&mut self.buffer)
    }

    pub fn address(&self) -> &DivertAddress {
        &self.address
    }

    pub fn packet(&self) -> &[u8] {
        &self.buffer
    }
}

/// 起動時に作る 4 種類の応答テンプレート
pub struct ReplyTemplates {
    pub reset_v4: TcpResetV4,
    pub unreachable_v4: IcmpUnreachableV4,
    pub reset_v6: TcpResetV6,
    pub unreachable_v6: Icmpv6UnreachableV6,
}

impl ReplyTemplates {
    pub fn new() -> DivertResult<Self> {
        Ok(Self {
            reset_v4: TcpResetV4::new()?,
            unreachable_v4: IcmpUnreachableV4::new()?,
            reset_v6: TcpResetV6::new()?,
            unreachable_v6: Icmpv6UnreachableV6::new()?,
        })
    }
}
