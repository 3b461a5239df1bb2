pub mod checksum;
pub mod divert;
pub mod packet;
pub mod template;
#[cfg(windows)]
pub mod win_divert;

use crate::core::config::DivertConfig;
use crate::error::InitProcessError;
use crate::network::divert::Diverter;

pub use divert::{CapturedPacket, DivertAddress};

/// フィルタに一致するパケットを迂回するドライバを開く
#[cfg(windows)]
pub fn open(filter: &str, config: &DivertConfig) -> Result<Box<dyn Diverter>, InitProcessError> {
    let device = win_divert::WinDivertDevice::open(filter, config.priority)?;
    Ok(Box::new(device))
}

#[cfg(not(windows))]
pub fn open(filter: &str, config: &DivertConfig) -> Result<Box<dyn Diverter>, InitProcessError> {
    log::debug!("迂回ドライバがありません (filter={:?}, priority={})", filter, config.priority);
    Err(InitProcessError::UnsupportedPlatform)
}
