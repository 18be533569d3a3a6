use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::value::Tag;

/// Index of a platform stream owned by the environment's stream table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct StreamId(u32);

impl StreamId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("stream table overflow"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Heap layout of a stream cell.
///
/// Platform streams reference a slot in the environment's [`StreamTable`];
/// function streams carry the callable instead and no platform slot.
#[derive(Debug)]
pub(crate) struct StreamData {
    pub id: Option<StreamId>,
    pub func: Tag,
}

impl StreamData {
    pub fn is_function(&self) -> bool {
        self.func.is_function()
    }
}

/// One platform byte stream with a single pushback slot.
#[derive(Debug)]
enum PlatformStream {
    InString { bytes: Vec<u8>, pos: usize, unread: Option<u8> },
    OutString { buf: Vec<u8> },
    InFile { reader: BufReader<File>, unread: Option<u8> },
    OutFile { writer: BufWriter<File> },
    Stdin { unread: Option<u8> },
    Stdout,
    Stderr,
    Closed,
}

/// Owns every platform stream opened in an environment.
///
/// Streams stay live until `close`; the collector never touches this table,
/// so an unreachable stream cell leaves its platform stream open.
#[derive(Debug, Default)]
pub(crate) struct StreamTable {
    streams: Vec<PlatformStream>,
}

impl StreamTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, stream: PlatformStream) -> StreamId {
        let id = StreamId::new(self.streams.len());
        self.streams.push(stream);
        id
    }

    pub fn open_stdin(&mut self) -> StreamId {
        self.push(PlatformStream::Stdin { unread: None })
    }

    pub fn open_stdout(&mut self) -> StreamId {
        self.push(PlatformStream::Stdout)
    }

    pub fn open_stderr(&mut self) -> StreamId {
        self.push(PlatformStream::Stderr)
    }

    pub fn open_input_string(&mut self, bytes: Vec<u8>) -> StreamId {
        self.push(PlatformStream::InString { bytes, pos: 0, unread: None })
    }

    pub fn open_output_string(&mut self, init: Vec<u8>) -> StreamId {
        self.push(PlatformStream::OutString { buf: init })
    }

    pub fn open_input_file(&mut self, path: &Path) -> io::Result<StreamId> {
        let file = File::open(path)?;
        Ok(self.push(PlatformStream::InFile { reader: BufReader::new(file), unread: None }))
    }

    pub fn open_output_file(&mut self, path: &Path) -> io::Result<StreamId> {
        let file = File::create(path)?;
        Ok(self.push(PlatformStream::OutFile { writer: BufWriter::new(file) }))
    }

    /// Next byte, or `None` at end of stream. Closed streams are at EOF.
    pub fn read_byte(&mut self, id: StreamId) -> Option<u8> {
        match &mut self.streams[id.index()] {
            PlatformStream::InString { bytes, pos, unread } => {
                if let Some(byte) = unread.take() {
                    return Some(byte);
                }
                let byte = bytes.get(*pos).copied()?;
                *pos += 1;
                Some(byte)
            }
            PlatformStream::InFile { reader, unread } => {
                if let Some(byte) = unread.take() {
                    return Some(byte);
                }
                let mut buf = [0u8; 1];
                match reader.read(&mut buf) {
                    Ok(1) => Some(buf[0]),
                    _ => None,
                }
            }
            PlatformStream::Stdin { unread } => {
                if let Some(byte) = unread.take() {
                    return Some(byte);
                }
                let mut buf = [0u8; 1];
                match io::stdin().lock().read(&mut buf) {
                    // EOT from an interactive terminal reads as end of stream.
                    Ok(1) if buf[0] != 0x04 => Some(buf[0]),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Pushes one byte of lookahead back. Only input streams participate.
    pub fn unread_byte(&mut self, id: StreamId, byte: u8) {
        match &mut self.streams[id.index()] {
            PlatformStream::InString { unread, .. }
            | PlatformStream::InFile { unread, .. }
            | PlatformStream::Stdin { unread } => *unread = Some(byte),
            _ => {}
        }
    }

    /// Writes one byte; writes on closed or input streams are ignored.
    pub fn write_byte(&mut self, id: StreamId, byte: u8) {
        match &mut self.streams[id.index()] {
            PlatformStream::OutString { buf } => buf.push(byte),
            PlatformStream::OutFile { writer } => {
                let _ = writer.write_all(&[byte]);
            }
            PlatformStream::Stdout => {
                let _ = io::stdout().write_all(&[byte]);
            }
            PlatformStream::Stderr => {
                let _ = io::stderr().write_all(&[byte]);
            }
            _ => {}
        }
    }

    /// EOF probe; consumes and restores one byte of lookahead on input.
    pub fn is_eof(&mut self, id: StreamId) -> bool {
        let needs_probe = match &self.streams[id.index()] {
            PlatformStream::InString { bytes, pos, unread } => {
                return unread.is_none() && *pos >= bytes.len();
            }
            PlatformStream::Closed => return true,
            PlatformStream::InFile { .. } | PlatformStream::Stdin { .. } => true,
            _ => false,
        };
        if !needs_probe {
            return false;
        }
        match self.read_byte(id) {
            Some(byte) => {
                self.unread_byte(id, byte);
                false
            }
            None => true,
        }
    }

    pub fn is_closed(&self, id: StreamId) -> bool {
        matches!(self.streams[id.index()], PlatformStream::Closed)
    }

    /// True for the string-buffer output variant.
    pub fn is_output_string(&self, id: StreamId) -> bool {
        matches!(self.streams[id.index()], PlatformStream::OutString { .. })
    }

    /// Drains the accumulated bytes of an output string stream.
    pub fn take_string(&mut self, id: StreamId) -> Option<Vec<u8>> {
        match &mut self.streams[id.index()] {
            PlatformStream::OutString { buf } => Some(std::mem::take(buf)),
            _ => None,
        }
    }

    pub fn flush(&mut self, id: StreamId) {
        match &mut self.streams[id.index()] {
            PlatformStream::OutFile { writer } => {
                let _ = writer.flush();
            }
            PlatformStream::Stdout => {
                let _ = io::stdout().flush();
            }
            PlatformStream::Stderr => {
                let _ = io::stderr().flush();
            }
            _ => {}
        }
    }

    pub fn close(&mut self, id: StreamId) {
        self.flush(id);
        self.streams[id.index()] = PlatformStream::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_input_reads_and_unreads() {
        let mut table = StreamTable::new();
        let id = table.open_input_string(b"ab".to_vec());
        assert_eq!(table.read_byte(id), Some(b'a'));
        table.unread_byte(id, b'a');
        assert_eq!(table.read_byte(id), Some(b'a'));
        assert_eq!(table.read_byte(id), Some(b'b'));
        assert_eq!(table.read_byte(id), None);
        assert!(table.is_eof(id));
    }

    #[test]
    fn output_string_collects_and_drains() {
        let mut table = StreamTable::new();
        let id = table.open_output_string(Vec::new());
        table.write_byte(id, b'h');
        table.write_byte(id, b'i');
        assert_eq!(table.take_string(id), Some(b"hi".to_vec()));
        assert_eq!(table.take_string(id), Some(Vec::new()));
    }

    #[test]
    fn closed_streams_read_eof_and_ignore_writes() {
        let mut table = StreamTable::new();
        let id = table.open_input_string(b"x".to_vec());
        table.close(id);
        assert!(table.is_closed(id));
        assert!(table.is_eof(id));
        assert_eq!(table.read_byte(id), None);
        table.write_byte(id, b'y');
    }
}
