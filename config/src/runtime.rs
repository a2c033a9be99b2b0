//! Host-runtime detection.
//!
//! The registry never probes for its host; it receives an optional
//! [`crate::source::RuntimeSettings`] from whoever starts the process. This
//! module is the one-time adapter that decides which host is active.
//!
//! ## Environment Variables
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `FORAGE_RUNTIME` | Explicit choice: `quarkus`, `spring-boot` or `none` |
//! | `QUARKUS_PROFILE` | Quarkus marker |
//! | `SPRING_PROFILES_ACTIVE` | Spring Boot marker |

use std::sync::OnceLock;

/// Host framework whose settings object can supply configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeKind {
    SpringBoot,
    Quarkus,
}

impl RuntimeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::SpringBoot => "spring-boot settings",
            Self::Quarkus => "quarkus settings",
        }
    }

    /// Quarkus marker beats Spring Boot marker; neither means no runtime.
    pub fn detect(markers: RuntimeMarkers) -> Option<Self> {
        if markers.quarkus {
            Some(Self::Quarkus)
        } else if markers.spring_boot {
            Some(Self::SpringBoot)
        } else {
            None
        }
    }
}

/// Presence of each host's marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeMarkers {
    pub quarkus: bool,
    pub spring_boot: bool,
}

impl RuntimeMarkers {
    /// Read markers from the process environment.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("FORAGE_RUNTIME").ok().as_deref(),
            std::env::var("QUARKUS_PROFILE").ok().as_deref(),
            std::env::var("SPRING_PROFILES_ACTIVE").ok().as_deref(),
        )
    }

    /// Pure decision over the raw variable values.
    pub fn from_values(
        explicit: Option<&str>,
        quarkus_profile: Option<&str>,
        spring_profiles: Option<&str>,
    ) -> Self {
        match explicit.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("quarkus") => Self {
                quarkus: true,
                spring_boot: false,
            },
            Some("spring-boot") | Some("spring_boot") | Some("springboot") => Self {
                quarkus: false,
                spring_boot: true,
            },
            Some("none") => Self::default(),
            _ => Self {
                quarkus: quarkus_profile.is_some_and(|v| !v.trim().is_empty()),
                spring_boot: spring_profiles.is_some_and(|v| !v.trim().is_empty()),
            },
        }
    }
}

static DETECTED: OnceLock<Option<RuntimeKind>> = OnceLock::new();

/// Runtime of this process, detected once and cached.
pub fn detected_runtime() -> Option<RuntimeKind> {
    *DETECTED.get_or_init(|| {
        let detected = RuntimeKind::detect(RuntimeMarkers::from_env());
        tracing::debug!("Detected host runtime: {detected:?}");
        detected
    })
}
