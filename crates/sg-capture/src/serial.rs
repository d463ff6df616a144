// Liaison série unique vers la carte (lecteur RFID, LED, micro).
//
// Architecture :
//   - `SerialLink::open`  : ouvre le port, attend le reset de la carte
//   - `read_loop`         : thread dédié, assemble les lignes, les pousse sur un canal borné
//   - `LineAssembler`     : découpe un flux d'octets en lignes complètes
//   - `try_read`          : badge et capteur dépilent le canal sans jamais bloquer

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, Sender, TrySendError};
use serialport::SerialPort;
use sg_core::traits::{Actuator, CredentialSource, SensorSource};

use crate::error::CaptureError;

/// Timeout de lecture du port : borne le temps de réaction à l'arrêt du thread.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Lignes en attente au maximum. Au-delà, les plus récentes sont perdues.
const LINE_BACKLOG: usize = 1024;

/// Commandes LED comprises par le firmware.
const LED_ON: &[u8] = b"H";
const LED_OFF: &[u8] = b"L";

/// Découpe un flux d'octets en lignes terminées par `\n`.
///
/// Les octets d'une ligne incomplète sont conservés jusqu'au prochain
/// `push`. Les lignes sont décodées en UTF-8 avec remplacement, nettoyées
/// des blancs, et les lignes vides sont ignorées.
///
/// # Example
/// ```
/// use sg_capture::serial::LineAssembler;
/// let mut lines = LineAssembler::default();
/// assert!(lines.push(b"51").is_empty());
/// assert_eq!(lines.push(b"2\r\n498\n"), vec!["512", "498"]);
/// ```
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
}

impl LineAssembler {
    /// Ajoute des octets et retourne les lignes complétées.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }
}

/// Interprète une ligne capteur. Tout ce qui n'est pas un nombre fini est rejeté.
///
/// # Example
/// ```
/// use sg_capture::serial::parse_reading;
/// assert_eq!(parse_reading(" 512 "), Some(512.0));
/// assert_eq!(parse_reading("69 DC FC D5"), None);
/// assert_eq!(parse_reading("NaN"), None);
/// ```
#[must_use]
pub fn parse_reading(line: &str) -> Option<f64> {
    line.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Liaison série partagée par le lecteur de badge, la LED et le capteur.
///
/// Le port est relâché (et le thread lecteur arrêté) au `Drop`, sur tous
/// les chemins de sortie.
pub struct SerialLink {
    port_name: String,
    writer: Box<dyn SerialPort>,
    lines: Receiver<String>,
    shutdown: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    led_pulse: Duration,
}

impl SerialLink {
    /// Ouvre `port` et lance le thread lecteur.
    ///
    /// Attend `settle` après l'ouverture : la carte redémarre à la connexion.
    ///
    /// # Errors
    /// Returns `CaptureError::LinkUnavailable` if the port cannot be opened or
    /// cloned, `CaptureError::Thread` if the reader thread cannot start.
    pub fn open(
        port: &str,
        baud_rate: u32,
        settle: Duration,
        led_pulse: Duration,
    ) -> Result<Self, CaptureError> {
        let unavailable = |e: serialport::Error| CaptureError::LinkUnavailable {
            port: port.to_string(),
            reason: e.to_string(),
        };

        let writer = serialport::new(port, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(unavailable)?;
        log::info!("Port série {port} ouvert à {baud_rate} bauds");

        thread::sleep(settle);

        let reader_port = writer.try_clone().map_err(unavailable)?;
        let (tx, rx) = flume::bounded(LINE_BACKLOG);
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let reader = thread::Builder::new()
            .name("sg-serial".to_string())
            .spawn(move || read_loop(reader_port, &tx, &flag))?;

        Ok(Self {
            port_name: port.to_string(),
            writer,
            lines: rx,
            shutdown,
            reader: Some(reader),
            led_pulse,
        })
    }

    #[must_use]
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn write_command(&mut self, cmd: &[u8]) -> io::Result<()> {
        self.writer.write_all(cmd)?;
        self.writer.flush()
    }
}

impl CredentialSource for SerialLink {
    fn try_read(&mut self) -> Option<String> {
        self.lines.try_recv().ok()
    }
}

impl SensorSource for SerialLink {
    fn try_read(&mut self) -> Option<f64> {
        let line = self.lines.try_recv().ok()?;
        let value = parse_reading(&line);
        if value.is_none() {
            log::trace!("Lecture capteur ignorée : {line:?}");
        }
        value
    }
}

impl Actuator for SerialLink {
    fn signal(&mut self) {
        if let Err(e) = self.write_command(LED_ON) {
            log::warn!("LED : écriture impossible sur {} : {e}", self.port_name);
            return;
        }
        thread::sleep(self.led_pulse);
        if let Err(e) = self.write_command(LED_OFF) {
            log::warn!("LED : extinction impossible sur {} : {e}", self.port_name);
        }
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reader.take()
            && handle.join().is_err()
        {
            log::warn!("Le thread lecteur série a paniqué");
        }
        log::info!("Port série {} fermé", self.port_name);
    }
}

/// Boucle du thread lecteur : lit le port, assemble, publie.
fn read_loop(mut port: Box<dyn SerialPort>, tx: &Sender<String>, shutdown: &AtomicBool) {
    let mut assembler = LineAssembler::default();
    let mut chunk = [0u8; 256];

    while !shutdown.load(Ordering::Relaxed) {
        match port.read(&mut chunk) {
            Ok(0) => {}
            Ok(n) => {
                for line in assembler.push(&chunk[..n]) {
                    match tx.try_send(line) {
                        Ok(()) => {}
                        Err(TrySendError::Full(line)) => {
                            log::trace!("File série pleine, ligne perdue : {line:?}");
                        }
                        Err(TrySendError::Disconnected(_)) => return,
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => {
                log::debug!("Lecture série : {e}");
                thread::sleep(READ_TIMEOUT);
            }
        }
    }
}
