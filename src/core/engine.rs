use crate::core::error::{DivertError, DivertResult};
use crate::network::divert::Diverter;
use crate::network::packet::ParsedPacket;
use crate::network::template::ReplyTemplates;
use crate::network::{CapturedPacket, DivertAddress};
use crate::report::{describe, Reporter};
use log::{debug, warn};
use std::fmt;

const NO_IPV4: DivertError = DivertError::Build("IPv4 ヘッダーがありません");
const NO_IPV6: DivertError = DivertError::Build("IPv6 ヘッダーがありません");
const NO_TCP: DivertError = DivertError::Build("TCP ヘッダーがありません");

/// 送信する拒否応答の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    TcpReset,
    TcpResetV6,
    IcmpUnreachable,
    Icmpv6Unreachable,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::TcpReset => write!(f, "TCP リセット"),
            Reply::TcpResetV6 => write!(f, "TCP (IPv6) リセット"),
            Reply::IcmpUnreachable => write!(f, "ICMP メッセージ"),
            Reply::Icmpv6Unreachable => write!(f, "ICMPv6 メッセージ"),
        }
    }
}

/// 1 パケットに対する処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// IPv4/IPv6 以外。出力も応答もしない
    Skipped,
    /// 再注入せずに破棄した (ICMP/ICMPv6 など)
    Dropped,
    /// 拒否応答を送った (送信失敗は警告のみ)
    Rejected(Reply),
}

/// 受信 → 解析 → 出力 → 応答 を繰り返す単一スレッドのループ
pub struct Rejector<D: Diverter, R: Reporter> {
    diverter: D,
    reporter: R,
    templates: ReplyTemplates,
    buffer_size: usize,
}

impl<D: Diverter, R: Reporter> Rejector<D, R> {
    pub fn new(diverter: D, reporter: R, buffer_size: usize) -> DivertResult<Self> {
        Ok(Self {
            diverter,
            reporter,
            templates: ReplyTemplates::new()?,
            buffer_size,
        })
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    /// 1 パケット分の処理。受信に失敗した場合は警告を出して `None`
    pub fn step(&mut self) -> Option<Verdict> {
        match self.diverter.recv(self.buffer_size) {
            Ok(captured) => Some(self.handle(&captured)),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    pub fn handle(&mut self, captured: &CapturedPacket) -> Verdict {
        let packet = ParsedPacket::parse(&captured.data);
        if !packet.has_network_header() {
            return Verdict::Skipped;
        }

        if let Err(e) = self.reporter.report(&describe(&packet)) {
            warn!("パケット情報の出力に失敗しました: {}", e);
        }

        // ICMP/ICMPv6 は再注入しないだけで破棄になる
        let reply = match (&packet.tcp, &packet.udp, packet.ipv4.is_some()) {
            (Some(_), _, true) => Reply::TcpReset,
            (Some(_), _, false) => Reply::TcpResetV6,
            (None, Some(_), true) => Reply::IcmpUnreachable,
            (None, Some(_), false) => Reply::Icmpv6Unreachable,
            (None, None, _) => return Verdict::Dropped,
        };

        match self.send_reply(reply, &captured.address, &packet) {
            Ok(()) => debug!("{}を送信しました", reply),
            Err(e) => warn!("{}の送信に失敗しました: {}", reply, e),
        }
        Verdict::Rejected(reply)
    }

    fn send_reply(&mut self, reply: Reply, address: &DivertAddress, packet: &ParsedPacket) -> DivertResult<()> {
        match reply {
            Reply::TcpReset => {
                let ip = packet.ipv4.as_ref().ok_or(NO_IPV4)?;
                let tcp = packet.tcp.as_ref().ok_or(NO_TCP)?;
                let reset = &mut self.templates.reset_v4;
                reset.patch(address, ip, tcp, packet.payload_len)?;
                self.diverter.send(reset.packet(), reset.address())
            }
            Reply::TcpResetV6 => {
                let ip = packet.ipv6.as_ref().ok_or(NO_IPV6)?;
                let tcp = packet.tcp.as_ref().ok_or(NO_TCP)?;
                let reset = &mut self.templates.reset_v6;
                reset.patch(address, ip, tcp, packet.payload_len)?;
                self.diverter.send(reset.packet(), reset.address())
            }
            Reply::IcmpUnreachable => {
                let ip = packet.ipv4.as_ref().ok_or(NO_IPV4)?;
                let unreachable = &mut self.templates.unreachable_v4;
                unreachable.patch(address, ip, packet.raw)?;
                self.diverter.send(unreachable.packet(), unreachable.address())
            }
            Reply::Icmpv6Unreachable => {
                let ip = packet.ipv6.as_ref().ok_or(NO_IPV6)?;
                let unreachable = &mut self.templates.unreachable_v6;
                unreachable.patch(address, ip, packet.raw)?;
                self.diverter.send(unreachable.packet(), unreachable.address())
            }
        }
    }
}
