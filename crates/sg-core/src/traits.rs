use crate::series::RecordedSeries;

/// Fournit les identifiants de badge présentés au lecteur.
///
/// Implémenté par : `SerialLink`, les sources scriptées des tests.
///
/// # Example
/// ```
/// use sg_core::traits::CredentialSource;
///
/// struct OneBadge(Option<String>);
/// impl CredentialSource for OneBadge {
///     fn try_read(&mut self) -> Option<String> { self.0.take() }
/// }
/// ```
pub trait CredentialSource: Send {
    /// Retourne l'identifiant en attente, s'il y en a un.
    ///
    /// Ne bloque JAMAIS.
    fn try_read(&mut self) -> Option<String>;
}

/// Signal visible (LED) déclenché sur badge accepté et sur correspondance.
pub trait Actuator: Send {
    /// Fire-and-forget. Les erreurs d'écriture sont journalisées, pas propagées.
    fn signal(&mut self);
}

/// Source de lectures capteur, une au plus par tick.
///
/// # Example
/// ```
/// use sg_core::traits::SensorSource;
///
/// struct Silent;
/// impl SensorSource for Silent {
///     fn try_read(&mut self) -> Option<f64> { None }
/// }
/// ```
pub trait SensorSource: Send {
    /// Retourne la prochaine lecture disponible.
    ///
    /// Ne bloque JAMAIS. Une charge utile illisible donne `None`.
    fn try_read(&mut self) -> Option<f64>;
}

/// Affichage du temps restant pendant l'enregistrement.
pub trait ProgressSink: Send {
    /// Appelé une fois par seconde avec les secondes restantes.
    ///
    /// # Errors
    /// An error aborts the countdown (the recording is stopped first).
    fn report(&mut self, seconds_remaining: u32) -> anyhow::Result<()>;
}

/// Stockage de séries nommées (deux tableaux parallèles).
pub trait SeriesStore {
    /// Error type of the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist `series` under `name`, replacing any previous one.
    ///
    /// # Errors
    /// Backend-specific failure.
    fn save(&self, name: &str, series: &RecordedSeries) -> Result<(), Self::Error>;

    /// Load the series stored under `name`.
    ///
    /// # Errors
    /// Backend-specific failure, including an unknown name.
    fn load(&self, name: &str) -> Result<RecordedSeries, Self::Error>;
}
