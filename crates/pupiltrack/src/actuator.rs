//! Edge-triggered single-byte command link to the drift actuator.
//!
//! `'H'` is sent when lock mode reports an alert, `'L'` when it reports safe.
//! A command goes out only when it differs from the last one sent; each send
//! then waits up to the ack timeout for a single reply byte.

use std::io;
use std::time::Duration;

use crate::config::ActuatorConfig;
use crate::error::ActuatorError;
use crate::lock::DriftState;

/// Command byte for an alert.
pub const COMMAND_ALERT: u8 = b'H';
/// Command byte for the safe state; also the state assumed at session start.
pub const COMMAND_SAFE: u8 = b'L';

/// Command byte for a drift state.
pub fn command_for(state: DriftState) -> u8 {
    match state {
        DriftState::Alert => COMMAND_ALERT,
        DriftState::Safe => COMMAND_SAFE,
    }
}

/// Byte transport to the actuator.
pub trait ActuatorPort {
    /// Write one command byte.
    fn send(&mut self, byte: u8) -> io::Result<()>;
    /// Read one byte, or `None` if nothing arrives within `timeout`.
    fn recv(&mut self, timeout: Duration) -> io::Result<Option<u8>>;
}

/// Command link state. Without a port every operation is a no-op.
pub struct ActuatorLink {
    port: Option<Box<dyn ActuatorPort>>,
    config: ActuatorConfig,
    last_sent: u8,
    retry_pending: bool,
}

impl std::fmt::Debug for ActuatorLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorLink")
            .field("connected", &self.port.is_some())
            .field("last_sent", &(self.last_sent as char))
            .field("retry_pending", &self.retry_pending)
            .finish()
    }
}

impl ActuatorLink {
    pub fn new(port: Box<dyn ActuatorPort>, config: ActuatorConfig) -> Self {
        Self {
            port: Some(port),
            config,
            last_sent: COMMAND_SAFE,
            retry_pending: false,
        }
    }

    /// Link with no actuator attached.
    pub fn disconnected(config: ActuatorConfig) -> Self {
        Self {
            port: None,
            config,
            last_sent: COMMAND_SAFE,
            retry_pending: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    /// Last command byte written (acknowledged or not).
    pub fn last_sent(&self) -> u8 {
        self.last_sent
    }

    /// Forward a drift state to the actuator.
    ///
    /// Returns the command byte when one was sent and acknowledged, `None`
    /// when nothing needed sending. A failed exchange is not retried until the
    /// state changes, unless `resend_on_failure` is set.
    pub fn apply(&mut self, state: DriftState) -> Result<Option<u8>, ActuatorError> {
        if self.port.is_none() {
            return Ok(None);
        }
        let command = command_for(state);
        let retry = self.config.resend_on_failure && self.retry_pending;
        if command == self.last_sent && !retry {
            return Ok(None);
        }
        self.exchange(command).map(Some)
    }

    /// Leave the actuator in the safe state and release the port.
    pub fn shutdown(&mut self) -> Result<(), ActuatorError> {
        if self.port.is_none() {
            return Ok(());
        }
        let result = if self.last_sent != COMMAND_SAFE || self.retry_pending {
            match self.exchange(COMMAND_SAFE) {
                Err(ActuatorError::RemoteTerminate) => Ok(()),
                other => other.map(|_| ()),
            }
        } else {
            Ok(())
        };
        self.port = None;
        tracing::info!("actuator link closed");
        result
    }

    /// Send `command` and wait for its acknowledgment.
    fn exchange(&mut self, command: u8) -> Result<u8, ActuatorError> {
        let Some(port) = self.port.as_mut() else {
            return Ok(command);
        };
        self.last_sent = command;
        self.retry_pending = true;

        port.send(command)?;
        tracing::debug!("actuator <- '{}'", command as char);

        match port.recv(self.config.ack_timeout())? {
            None => Err(ActuatorError::AckTimeout { command }),
            Some(b) if b == self.config.ack_byte => {
                self.retry_pending = false;
                Ok(command)
            }
            Some(b) if b == self.config.terminate_byte => {
                self.retry_pending = false;
                tracing::info!("actuator requested shutdown");
                Err(ActuatorError::RemoteTerminate)
            }
            Some(got) => Err(ActuatorError::AckMismatch {
                expected: self.config.ack_byte,
                got,
            }),
        }
    }
}

#[cfg(feature = "serial")]
pub use self::serial::{open_serial, SerialActuatorPort};

#[cfg(feature = "serial")]
mod serial {
    use std::io::{self, Read, Write};
    use std::time::Duration;

    use serialport::{ClearBuffer, SerialPort};

    use super::ActuatorPort;

    /// [`ActuatorPort`] over a serial device.
    pub struct SerialActuatorPort {
        port: Box<dyn SerialPort>,
    }

    /// Open `path` at `baud` (8N1, no flow control).
    pub fn open_serial(path: &str, baud: u32) -> io::Result<SerialActuatorPort> {
        let port = serialport::new(path, baud)
            .timeout(Duration::from_millis(100))
            .open()?;
        tracing::info!("serial actuator on {} at {} baud", path, baud);
        Ok(SerialActuatorPort { port })
    }

    impl ActuatorPort for SerialActuatorPort {
        fn send(&mut self, byte: u8) -> io::Result<()> {
            // Stale replies would be taken as the ack of this command.
            self.port.clear(ClearBuffer::Input)?;
            self.port.write_all(&[byte])?;
            self.port.flush()
        }

        fn recv(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
            self.port.set_timeout(timeout)?;
            let mut buf = [0u8; 1];
            match self.port.read(&mut buf) {
                Ok(0) => Ok(None),
                Ok(_) => Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
                Err(e) => Err(e),
            }
        }
    }
}
