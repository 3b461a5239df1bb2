use crate::core::error::DivertResult;

/// パケットの進行方向 (迂回ドライバの値と同じく Outbound = 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Outbound,
    Inbound,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Outbound => Direction::Inbound,
            Direction::Inbound => Direction::Outbound,
        }
    }
}

/// 迂回ドライバがパケットに付与するメタデータ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DivertAddress {
    pub if_idx: u32,
    pub sub_if_idx: u32,
    pub direction: Direction,
}

/// 受信したパケット。バッファはループ 1 回分だけ保持される
#[derive(Debug, Clone)]
pub struct CapturedPacket {
    pub data: Vec<u8>,
    pub address: DivertAddress,
}

/// パケットの取得と注入を担う迂回ドライバ
pub trait Diverter {
    /// フィルタに一致する次のパケットを受信する (ブロッキング)
    fn recv(&mut self, capacity: usize) -> DivertResult<CapturedPacket>;

    /// パケットを注入する
    fn send(&mut self, packet: &[u8], address: &DivertAddress) -> DivertResult<()>;
}

impl<D: Diverter + ?Sized> Diverter for Box<D> {
    fn recv(&mut self, capacity: usize) -> DivertResult<CapturedPacket> {
        (**self).recv(capacity)
    }

    fn send(&mut self, packet: &[u8], address: &DivertAddress) -> DivertResult<()> {
        (**self).send(packet, address)
    }
}
