use std::io::Read;
use std::net::{ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// Reads the datagrams of a UDP socket as one byte stream, so NMEA
/// broadcasts can be consumed with a `BufReader` like a log file.
pub struct UdpStream {
    socket: UdpSocket,
}

impl UdpStream {
    pub fn open<T: ToSocketAddrs>(addr: T) -> std::io::Result<Self> {
        Ok(UdpStream { socket: UdpSocket::bind(addr)? })
    }

    /// Makes reads return `WouldBlock`/`TimedOut` after `timeout`, so the
    /// caller gets a chance to run its periodic work on a silent bus
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }
}

impl Read for UdpStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.socket.recv(buf)
    }
}
