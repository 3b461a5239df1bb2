pub const UDP_HEADER_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct UDPHeader {
    pub source_port: u16,
    pub destination_port: u16,
}

impl UDPHeader {
    /// ペイロードは Length フィールドとキャプチャ長の短い方で切る
    pub fn parse(data: &[u8]) -> Option<(Self, &[u8])> {
        let header = data.get(..UDP_HEADER_LEN)?;
        let length = u16::from_be_bytes([header[4], header[5]]);
        if (length as usize) < UDP_HEADER_LEN {
            return None;
        }
        let end = data.len().min(length as usize);

        Some((
            Self {
                source_port: u16::from_be_bytes([header[0], header[1]]),
                destination_port: u16::from_be_bytes([header[2], header[3]]),
            },
            &data[UDP_HEADER_LEN..end],
        ))
    }
}
