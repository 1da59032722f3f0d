use super::{LogWriter, WriteError};
use std::fmt;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Base of every pipeline: hands whole entries to a byte stream.
pub struct TransportWriter<W> {
    inner: W,
}

impl<W: Write + Send> TransportWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> LogWriter for TransportWriter<W> {
    fn write_entry(&mut self, buf: &[u8]) -> Result<(), WriteError> {
        self.inner.write_all(buf)?;
        self.inner.flush()?;
        Ok(())
    }
}

#[derive(Error, Debug)]
#[error("unknown network protocol '{0}', expected one of tcp, tcp4, tcp6, udp, udp4, udp6, unix")]
pub struct UnknownProtocol(pub String);

/// Network protocols accepted for the Logstash connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Tcp4,
    Tcp6,
    Udp,
    Udp4,
    Udp6,
    Unix,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Tcp4 => "tcp4",
            Protocol::Tcp6 => "tcp6",
            Protocol::Udp => "udp",
            Protocol::Udp4 => "udp4",
            Protocol::Udp6 => "udp6",
            Protocol::Unix => "unix",
        }
    }

    fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            Protocol::Tcp4 | Protocol::Udp4 => addr.is_ipv4(),
            Protocol::Tcp6 | Protocol::Udp6 => addr.is_ipv6(),
            Protocol::Tcp | Protocol::Udp | Protocol::Unix => true,
        }
    }
}

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "tcp4" => Ok(Protocol::Tcp4),
            "tcp6" => Ok(Protocol::Tcp6),
            "udp" => Ok(Protocol::Udp),
            "udp4" => Ok(Protocol::Udp4),
            "udp6" => Ok(Protocol::Udp6),
            "unix" => Ok(Protocol::Unix),
            _ => Err(UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An established connection to the log collector.
#[derive(Debug)]
pub enum Connection {
    Tcp(TcpStream),
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    /// Connects eagerly; `address` is `host:port`, or a socket path for unix.
    pub fn open(protocol: Protocol, address: &str) -> io::Result<Self> {
        match protocol {
            Protocol::Tcp | Protocol::Tcp4 | Protocol::Tcp6 => {
                let addrs = resolve(protocol, address)?;
                Ok(Connection::Tcp(TcpStream::connect(&addrs[..])?))
            }
            Protocol::Udp | Protocol::Udp4 | Protocol::Udp6 => {
                let addrs = resolve(protocol, address)?;
                let target = addrs[0];
                let local: SocketAddr = if target.is_ipv4() {
                    ([0, 0, 0, 0], 0).into()
                } else {
                    ([0_u16; 8], 0).into()
                };
                let socket = UdpSocket::bind(local)?;
                socket.connect(target)?;
                Ok(Connection::Udp(socket))
            }
            #[cfg(unix)]
            Protocol::Unix => Ok(Connection::Unix(UnixStream::connect(address)?)),
            #[cfg(not(unix))]
            Protocol::Unix => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix sockets are not supported on this platform",
            )),
        }
    }
}

fn resolve(protocol: Protocol, address: &str) -> io::Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = address
        .to_socket_addrs()?
        .filter(|addr| protocol.accepts(addr))
        .collect();

    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no {protocol} address found for '{address}'"),
        ));
    }
    Ok(addrs)
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Connection::Tcp(stream) => stream.write(buf),
            Connection::Udp(socket) => socket.send(buf),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Connection::Tcp(stream) => stream.flush(),
            Connection::Udp(_) => Ok(()),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_parse_protocol() {
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("udp6".parse::<Protocol>().unwrap(), Protocol::Udp6);
        assert_eq!("unix".parse::<Protocol>().unwrap(), Protocol::Unix);
        assert!("http".parse::<Protocol>().is_err());
        // Names are matched exactly, as the network dialer spells them.
        assert!("UDP6".parse::<Protocol>().is_err());
        assert!("Tcp".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_transport_writer_writes_whole_buffer() {
        let mut writer = TransportWriter::new(Vec::new());
        writer.write_entry(b"one\n").unwrap();
        writer.write_entry(b"two\n").unwrap();

        assert_eq!(writer.into_inner(), b"one\ntwo\n");
    }

    #[test]
    fn test_transport_errors_are_not_overflow() {
        let mut writer = TransportWriter::new(BrokenPipe);
        let err = writer.write_entry(b"line\n").unwrap_err();

        assert!(matches!(err, WriteError::Transport(_)));
        assert_eq!(err.overflow(), None);
    }

    #[test]
    fn test_tcp_connection_delivers_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let mut writer = TransportWriter::new(Connection::open(Protocol::Tcp, &address).unwrap());
        let (mut peer, _) = listener.accept().unwrap();

        writer.write_entry(b"{\"message\":\"hi\"}\n").unwrap();
        drop(writer);

        let mut received = String::new();
        peer.read_to_string(&mut received).unwrap();
        assert_eq!(received, "{\"message\":\"hi\"}\n");
    }

    #[test]
    fn test_udp_connection_sends_one_datagram_per_entry() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let address = receiver.local_addr().unwrap().to_string();

        let mut writer = TransportWriter::new(Connection::open(Protocol::Udp4, &address).unwrap());
        writer.write_entry(b"datagram\n").unwrap();

        let mut buf = [0_u8; 64];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"datagram\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_connection_delivers_bytes() {
        use std::os::unix::net::UnixListener;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logstash.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let mut writer =
            TransportWriter::new(Connection::open(Protocol::Unix, path.to_str().unwrap()).unwrap());
        let (mut peer, _) = listener.accept().unwrap();

        writer.write_entry(b"unix\n").unwrap();
        drop(writer);

        let mut received = String::new();
        peer.read_to_string(&mut received).unwrap();
        assert_eq!(received, "unix\n");
    }

    #[test]
    fn test_family_filter_rejects_mismatched_address() {
        let err = Connection::open(Protocol::Tcp6, "127.0.0.1:5000").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrNotAvailable);
    }

    #[test]
    fn test_connection_refused() {
        // Bind then drop to obtain a port with nothing listening.
        let address = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .to_string();

        assert!(Connection::open(Protocol::Tcp, &address).is_err());
    }
}
