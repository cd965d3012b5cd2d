//! In-memory device and loopback Modbus TCP server for tests.

use std::{
    collections::{HashMap, HashSet},
    io,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tokio_modbus::{Address, ExceptionCode, SlaveId};

use crate::api::modbus::{
    ConnectError,
    ConnectionState,
    Endpoint,
    RegisterKind,
    Transport,
    TransportError,
};

#[derive(Default)]
pub struct FakeTransport {
    pub holding: HashMap<Address, u16>,
    pub input: HashMap<Address, u16>,
    pub connected: bool,
    pub n_disconnects: u64,
    pub n_connects: u64,

    /// Refuse new connections.
    pub refuse_connect: bool,

    /// Reading any of these addresses resets the connection.
    pub fail_at: HashSet<Address>,

    /// Reading any of these addresses never completes.
    pub stall_at: HashSet<Address>,

    pub writes: Vec<(Address, u16, SlaveId)>,
}

impl FakeTransport {
    pub fn with_holding(registers: impl IntoIterator<Item = (Address, u16)>) -> Self {
        Self { holding: registers.into_iter().collect(), ..Self::default() }
    }

    pub fn connected(mut self) -> Self {
        self.connected = true;
        self
    }
}

impl Transport for FakeTransport {
    fn state(&self) -> ConnectionState {
        if self.connected { ConnectionState::Connected } else { ConnectionState::Disconnected }
    }

    fn n_disconnects(&self) -> u64 {
        self.n_disconnects
    }

    async fn connect(&mut self) -> Result<(), ConnectError> {
        self.disconnect().await;
        if self.refuse_connect {
            return Err(ConnectError::Io(io::Error::from(io::ErrorKind::ConnectionRefused)));
        }
        self.connected = true;
        self.n_connects += 1;
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            self.n_disconnects += 1;
        }
    }

    async fn read_registers(
        &mut self,
        kind: RegisterKind,
        address: Address,
        count: u16,
        _station_id: SlaveId,
    ) -> Result<Vec<u16>, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if self.stall_at.contains(&address) {
            std::future::pending::<()>().await;
        }
        if self.fail_at.contains(&address) {
            self.disconnect().await;
            return Err(TransportError::Network(io::Error::from(io::ErrorKind::ConnectionReset)));
        }
        let registers = match kind {
            RegisterKind::Holding => &self.holding,
            RegisterKind::Input => &self.input,
        };
        (0..count)
            .map(|offset| address.checked_add(offset).and_then(|it| registers.get(&it).copied()))
            .collect::<Option<Vec<u16>>>()
            .ok_or(TransportError::Exception(ExceptionCode::IllegalDataAddress))
    }

    async fn write_register(
        &mut self,
        address: Address,
        value: u16,
        station_id: SlaveId,
    ) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.holding.insert(address, value);
        self.writes.push((address, value, station_id));
        Ok(())
    }
}

/// How the loopback server answers every request.
#[derive(Clone)]
pub enum Reply {
    /// Register words for a read request.
    Words(Vec<u16>),

    /// Exception response with the code.
    Exception(u8),

    /// Read response under the other read function code.
    WrongFunction(Vec<u16>),

    /// Close the connection without answering.
    Reset,

    /// Read the request and never answer.
    Silence,
}

/// Spawn a Modbus TCP server on a loopback port.
pub async fn listen(reply: Reply) -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let reply = reply.clone();
            tokio::spawn(async move {
                // MBAP header: transaction, protocol, length, unit.
                let mut header = [0_u8; 7];
                while stream.read_exact(&mut header).await.is_ok() {
                    let length = usize::from(u16::from_be_bytes([header[4], header[5]]));
                    let mut request = vec![0_u8; length.saturating_sub(1)];
                    if stream.read_exact(&mut request).await.is_err() {
                        break;
                    }
                    let function = request[0];
                    let response = match &reply {
                        Reply::Words(words) => read_response(function, words),
                        Reply::WrongFunction(words) => read_response(function ^ 0x07, words),
                        Reply::Exception(code) => vec![function | 0x80, *code],
                        Reply::Reset => break,
                        Reply::Silence => continue,
                    };
                    let mut frame = header[..4].to_vec();
                    frame.extend(u16::try_from(response.len() + 1).unwrap().to_be_bytes());
                    frame.push(header[6]);
                    frame.extend(response);
                    if stream.write_all(&frame).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    Endpoint::new("127.0.0.1", port)
}

fn read_response(function: u8, words: &[u16]) -> Vec<u8> {
    let mut response = vec![function, u8::try_from(words.len() * 2).unwrap()];
    response.extend(words.iter().flat_map(|word| word.to_be_bytes()));
    response
}
