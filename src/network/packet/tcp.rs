pub const TCP_HEADER_LEN: usize = 20;

#[derive(Debug, Clone)]
pub struct TCPHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub acknowledgment_number: u32,
    pub flags: TCPFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TCPFlags {
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

impl TCPFlags {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            urg: (byte & 0x20) != 0,
            ack: (byte & 0x10) != 0,
            psh: (byte & 0x08) != 0,
            rst: (byte & 0x04) != 0,
            syn: (byte & 0x02) != 0,
            fin: (byte & 0x01) != 0,
        }
    }
}

impl TCPHeader {
    /// ヘッダーとオプションを除いたペイロードを返す
    pub fn parse(data: &[u8]) -> Option<(Self, &[u8])> {
        if data.len() < TCP_HEADER_LEN {
            return None;
        }

        let data_offset = (data[12] >> 4) & 0xf;
        let header_len = data_offset as usize * 4;
        if header_len < TCP_HEADER_LEN || data.len() < header_len {
            return None;
        }

        let source_port = u16::from_be_bytes([data[0], data[1]]);
        let destination_port = u16::from_be_bytes([data[2], data[3]]);
        let sequence_number = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let acknowledgment_number = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
        let flags = TCPFlags::from_byte(data[13]);

        Some((
            Self {
                source_port,
                destination_port,
                sequence_number,
                acknowledgment_number,
                flags,
            },
            &data[header_len..],
        ))
    }
}
