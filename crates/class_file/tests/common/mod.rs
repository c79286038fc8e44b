#![allow(dead_code)]

/// Assembles class file bytes by hand for inputs javac will not produce.
///
/// Constant pool entries are appended first and hand back their index; the body (everything
/// after the pool) is then written with the raw `u2`/`u4` helpers.
pub struct ClassBytes {
    pool: Vec<u8>,
    next_index: u16,
    body: Vec<u8>,
}
impl ClassBytes {
    pub fn new() -> Self {
        Self {
            pool: vec![],
            next_index: 1,
            body: vec![],
        }
    }

    fn entry(&mut self, tag: u8, payload: &[u8], slots: u16) -> u16 {
        let index = self.next_index;
        self.pool.push(tag);
        self.pool.extend_from_slice(payload);
        self.next_index += slots;
        index
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        self.raw_utf8(s.as_bytes())
    }

    pub fn raw_utf8(&mut self, bytes: &[u8]) -> u16 {
        let mut payload = (bytes.len() as u16).to_be_bytes().to_vec();
        payload.extend_from_slice(bytes);
        self.entry(1, &payload, 1)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.entry(7, &name_index.to_be_bytes(), 1)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        self.entry(3, &value.to_be_bytes(), 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        self.entry(5, &value.to_be_bytes(), 2)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        self.entry(6, &value.to_be_bytes(), 2)
    }

    pub fn string(&mut self, s: &str) -> u16 {
        let utf8_index = self.utf8(s);
        self.entry(8, &utf8_index.to_be_bytes(), 1)
    }

    pub fn u2(&mut self, value: u16) -> &mut Self {
        self.body.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u4(&mut self, value: u32) -> &mut Self {
        self.body.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.body.extend_from_slice(bytes);
        self
    }

    /// Writes an attribute whose declared length matches `info`.
    pub fn attribute(&mut self, name_index: u16, info: &[u8]) -> &mut Self {
        self.u2(name_index).u4(info.len() as u32).bytes(info)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
        bytes.extend_from_slice(&self.next_index.to_be_bytes());
        bytes.extend_from_slice(&self.pool);
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// Concatenates big-endian `u2` values, for attribute payloads.
pub fn u2s(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

pub fn init_logger() {
    let _ = pretty_env_logger::try_init();
}
