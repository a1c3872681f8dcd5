/// A byte buffer that holds a mutable or immutable byte slice.
#[derive(Debug)]
pub enum Buffer<'a> {
    Immutable(&'a [u8]),
    Mutable(&'a mut [u8]),
}

impl Buffer<'_> {
    /// Access the buffer as an immutable slice of bytes.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Immutable(packet) => packet,
            Buffer::Mutable(packet) => packet,
        }
    }

    /// Access the buffer as a mutable slice of bytes.
    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        match self {
            Buffer::Immutable(_) => panic!("write operation called on readonly buffer"),
            Buffer::Mutable(packet) => packet,
        }
    }

    /// Get the byte at a given offset.
    pub fn read(&self, offset: usize) -> u8 {
        self.as_slice()[offset]
    }

    /// Get a mutable reference to the byte at a given offset.
    pub fn write(&mut self, offset: usize) -> &mut u8 {
        &mut self.as_slice_mut()[offset]
    }

    /// Get N bytes from the packet at a given byte offset.
    pub fn get_bytes<const N: usize>(&self, offset: usize) -> [u8; N] {
        core::array::from_fn(|i| self.read(offset + i))
    }

    /// Set N bytes in the packet at a given offset.
    pub fn set_bytes<const N: usize>(&mut self, offset: usize, bytes: [u8; N]) {
        self.as_slice_mut()[offset..offset + N].copy_from_slice(&bytes);
    }

    /// Read a network byte order `u16` at a given offset.
    pub fn get_u16(&self, offset: usize) -> u16 {
        u16::from_be_bytes(self.get_bytes(offset))
    }

    /// Write a `u16` in network byte order at a given offset.
    pub fn set_u16(&mut self, offset: usize, val: u16) {
        self.set_bytes(offset, val.to_be_bytes());
    }

    /// Read a network byte order `u32` at a given offset.
    pub fn get_u32(&self, offset: usize) -> u32 {
        u32::from_be_bytes(self.get_bytes(offset))
    }

    /// Write a `u32` in network byte order at a given offset.
    pub fn set_u32(&mut self, offset: usize, val: u32) {
        self.set_bytes(offset, val.to_be_bytes());
    }
}
