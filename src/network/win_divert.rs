use crate::core::error::{DivertError, DivertResult};
use crate::error::InitProcessError;
use crate::network::divert::{CapturedPacket, DivertAddress, Diverter, Direction};
use std::borrow::Cow;
use windivert::address::WinDivertAddress;
use windivert::error::{WinDivertError, WinDivertOpenError};
use windivert::prelude::*;

/// WinDivert のネットワーク層ハンドル
pub struct WinDivertDevice {
    handle: WinDivert<NetworkLayer>,
    // 注入用アドレスの雛形。最後に受信したパケットのものを使う
    last_address: Option<WinDivertAddress<NetworkLayer>>,
}

impl WinDivertDevice {
    pub fn open(filter: &str, priority: i16) -> Result<Self, InitProcessError> {
        let handle = WinDivert::network(filter, priority, WinDivertFlags::new()).map_err(|e| {
            log::debug!("WinDivert のオープンに失敗しました: {:?}", e);
            open_error(e)
        })?;

        Ok(Self {
            handle,
            last_address: None,
        })
    }
}

/// オープン失敗の分類。フィルタの構文エラー (ERROR_INVALID_PARAMETER) とそれ以外を分ける
fn open_error(error: WinDivertError) -> InitProcessError {
    match error {
        WinDivertError::Open(WinDivertOpenError::InvalidParameter) => InitProcessError::InvalidFilterSyntax,
        // フィルタ中の NUL はドライバに渡す前に失敗する
        WinDivertError::NullError(_) => InitProcessError::InvalidFilterSyntax,
        WinDivertError::Open(open) => InitProcessError::OpenFailed(open_error_code(&open)),
        WinDivertError::IOError(io) => InitProcessError::OpenFailed(io.raw_os_error().unwrap_or(-1)),
        _ => InitProcessError::OpenFailed(-1),
    }
}

fn open_error_code(error: &WinDivertOpenError) -> i32 {
    match error {
        WinDivertOpenError::MissingSYS => 2,
        WinDivertOpenError::AccessDenied => 5,
        WinDivertOpenError::InvalidParameter => 87,
        WinDivertOpenError::InvalidImageHash => 577,
        WinDivertOpenError::IncompatibleVersion => 654,
        WinDivertOpenError::MissingInstall => 1060,
        WinDivertOpenError::DriverBlocked => 1257,
        WinDivertOpenError::BaseFilteringEngineDisabled => 1753,
    }
}

/// 受信したアドレスを雛形に、生成したパケット用のアドレスを作る
///
/// Impostor は自前のパケットなので落とす。チェックサムは送信前に計算済み。
/// Loopback はインターフェースに付随する値なので元パケットのものを引き継ぐ。
fn reply_address(
    captured: &WinDivertAddress<NetworkLayer>,
    address: &DivertAddress,
) -> WinDivertAddress<NetworkLayer> {
    let mut reply = captured.clone();
    reply.set_interface_index(address.if_idx);
    reply.set_subinterface_index(address.sub_if_idx);
    reply.set_outbound(address.direction == Direction::Outbound);
    reply.set_impostor(false);
    reply.set_ip_checksum(true);
    reply.set_tcp_checksum(true);
    reply.set_udp_checksum(true);
    reply
}

impl Diverter for WinDivertDevice {
    fn recv(&mut self, capacity: usize) -> DivertResult<CapturedPacket> {
        let mut buffer = vec![0u8; capacity];
        let packet = self
            .handle
            .recv(Some(&mut buffer))
            .map_err(|e| DivertError::Recv(format!("{:?}", e)))?;

        let address = DivertAddress {
            if_idx: packet.address.interface_index(),
            sub_if_idx: packet.address.subinterface_index(),
            direction: if packet.address.outbound() {
                Direction::Outbound
            } else {
                Direction::Inbound
            },
        };
        let data = packet.data.to_vec();
        self.last_address = Some(packet.address.clone());

        Ok(CapturedPacket { data, address })
    }

    fn send(&mut self, packet: &[u8], address: &DivertAddress) -> DivertResult<()> {
        let captured = self
            .last_address
            .as_ref()
            .ok_or_else(|| DivertError::Send("受信前に送信しようとしました".to_string()))?;

        let packet = WinDivertPacket::<NetworkLayer> {
            address: reply_address(captured, address),
            data: Cow::Borrowed(packet),
        };
        self.handle
            .send(&packet)
            .map_err(|e| DivertError::Send(format!("{:?}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn invalid_parameter_is_a_syntax_error() {
        let error = WinDivertError::Open(WinDivertOpenError::InvalidParameter);
        assert!(matches!(open_error(error), InitProcessError::InvalidFilterSyntax));
    }

    #[test]
    fn nul_in_filter_is_a_syntax_error() {
        let nul = CString::new("tcp\0").unwrap_err();
        assert!(matches!(open_error(WinDivertError::NullError(nul)), InitProcessError::InvalidFilterSyntax));
    }

    #[test]
    fn other_failures_keep_their_code() {
        let denied = WinDivertError::Open(WinDivertOpenError::AccessDenied);
        assert!(matches!(open_error(denied), InitProcessError::OpenFailed(5)));

        let unknown = WinDivertError::IOError(std::io::Error::from_raw_os_error(1275));
        assert!(matches!(open_error(unknown), InitProcessError::OpenFailed(1275)));
    }

    #[test]
    fn reply_address_drops_impostor_and_applies_route() {
        let mut captured = unsafe { WinDivertAddress::<NetworkLayer>::new() };
        captured.set_impostor(true);
        captured.set_outbound(true);

        let reply = reply_address(
            &captured,
            &DivertAddress {
                if_idx: 7,
                sub_if_idx: 2,
                direction: Direction::Inbound,
            },
        );
        assert!(!reply.impostor());
        assert!(!reply.outbound());
        assert!(reply.ip_checksum() && reply.tcp_checksum() && reply.udp_checksum());
        assert_eq!(reply.interface_index(), 7);
        assert_eq!(reply.subinterface_index(), 2);
    }
}
