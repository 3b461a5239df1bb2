use crate::network::packet::ParsedPacket;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use std::io::{self, Write};

/// ブロックしたパケットの出力先
pub trait Reporter {
    fn report(&mut self, fields: &str) -> io::Result<()>;
}

/// パケットの各ヘッダーを `key=value` 形式で並べる
///
/// 順序は IPv4, IPv6, ICMP, ICMPv6, TCP, UDP の固定。
pub fn describe(packet: &ParsedPacket) -> String {
    let mut tokens: Vec<String> = Vec::new();

    if let Some(ip) = &packet.ipv4 {
        tokens.push(format!("ip.SrcAddr={}", ip.source));
        tokens.push(format!("ip.DstAddr={}", ip.destination));
    }
    if let Some(ipv6) = &packet.ipv6 {
        tokens.push(format!("ipv6.SrcAddr={}", ipv6.source));
        tokens.push(format!("ipv6.DstAddr={}", ipv6.destination));
    }
    if let Some(icmp) = &packet.icmp {
        tokens.push(format!("icmp.Type={}", icmp.icmp_type));
        tokens.push(format!("icmp.Code={}", icmp.icmp_code));
    }
    if let Some(icmpv6) = &packet.icmpv6 {
        tokens.push(format!("icmpv6.Type={}", icmpv6.icmp_type));
        tokens.push(format!("icmpv6.Code={}", icmpv6.icmp_code));
    }
    if let Some(tcp) = &packet.tcp {
        tokens.push(format!("tcp.SrcPort={}", tcp.source_port));
        tokens.push(format!("tcp.DstPort={}", tcp.destination_port));

        let flags = [
            (tcp.flags.fin, "[FIN]"),
            (tcp.flags.rst, "[RST]"),
            (tcp.flags.urg, "[URG]"),
            (tcp.flags.syn, "[SYN]"),
            (tcp.flags.psh, "[PSH]"),
            (tcp.flags.ack, "[ACK]"),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| *name)
        .collect::<String>();
        tokens.push(format!("tcp.Flags={}", flags));
    }
    if let Some(udp) = &packet.udp {
        tokens.push(format!("udp.SrcPort={}", udp.source_port));
        tokens.push(format!("udp.DstPort={}", udp.destination_port));
    }

    tokens.join(" ")
}

/// 標準出力に `BLOCK` を赤、フィールドを白で出力する
pub struct ConsoleReporter {
    color: bool,
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, fields: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();

        if self.color {
            queue!(
                stdout,
                SetForegroundColor(Color::Red),
                Print("BLOCK "),
                SetForegroundColor(Color::White),
                Print(fields),
                ResetColor,
                Print("\n")
            )?;
        } else {
            writeln!(stdout, "BLOCK {}", fields)?;
        }

        stdout.flush()
    }
}
