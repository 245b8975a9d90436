// Byte-order selection for stored slots; slots hold raw words already in the selected order.

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ByteOrder {
    #[default]
    Native,
    Little,
    Big,
}

impl ByteOrder {
    /// The concrete order this selection denotes on the current host.
    pub fn resolve(self) -> ByteOrder {
        match self {
            ByteOrder::Native if cfg!(target_endian = "big") => ByteOrder::Big,
            ByteOrder::Native => ByteOrder::Little,
            other => other,
        }
    }

    pub fn is_native(self) -> bool {
        self.resolve() == ByteOrder::Native.resolve()
    }

    /// Word whose in-memory bytes are `value` in this order.
    pub fn encode(self, value: f64) -> u64 {
        match self.resolve() {
            ByteOrder::Big => value.to_bits().to_be(),
            _ => value.to_bits().to_le(),
        }
    }

    pub fn decode(self, word: u64) -> f64 {
        match self.resolve() {
            ByteOrder::Big => f64::from_bits(u64::from_be(word)),
            _ => f64::from_bits(u64::from_le(word)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self.resolve() {
            ByteOrder::Big => "big",
            _ => "little",
        }
    }
}
