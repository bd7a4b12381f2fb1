//! Platform collaborator: pointer capability and operating system tags
//! decided once at startup.

/// Whether the surface can produce pointer hover at all. Chosen once; the
/// hover adapter and paint reconciliation both branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerCapability {
    PointerCapable,
    TouchOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingSystem {
    Linux,
    MacOs,
    Windows,
    Ios,
    Android,
    Other,
}

impl OperatingSystem {
    pub fn detect() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else if cfg!(target_os = "android") {
            Self::Android
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub pointer: PointerCapability,
    pub os: OperatingSystem,
}

impl Platform {
    /// Detect the host platform. Terminal sessions on desktop systems get
    /// pointer hover; mobile targets are treated as touch-only.
    pub fn detect() -> Self {
        let os = OperatingSystem::detect();
        let pointer = match os {
            OperatingSystem::Ios | OperatingSystem::Android => PointerCapability::TouchOnly,
            _ => PointerCapability::PointerCapable,
        };
        Self { pointer, os }
    }

    /// Fixed pointer-capable platform, for tests and embedding hosts.
    pub fn pointer_capable() -> Self {
        Self {
            pointer: PointerCapability::PointerCapable,
            os: OperatingSystem::detect(),
        }
    }

    /// Fixed touch-only platform.
    pub fn touch_only() -> Self {
        Self {
            pointer: PointerCapability::TouchOnly,
            os: OperatingSystem::detect(),
        }
    }

    pub fn supports_pointer_hover(&self) -> bool {
        self.pointer == PointerCapability::PointerCapable
    }

    /// Whether imperatively syncing native input focus to a card means
    /// anything on this platform. Touch surfaces have no native focus
    /// concept worth driving.
    pub fn supports_native_focus_sync(&self) -> bool {
        !matches!(self.os, OperatingSystem::Ios | OperatingSystem::Android)
            && self.supports_pointer_hover()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_only_never_hovers_or_syncs() {
        let platform = Platform::touch_only();
        assert!(!platform.supports_pointer_hover());
        assert!(!platform.supports_native_focus_sync());
    }

    #[test]
    fn pointer_capable_hosts_hover() {
        let platform = Platform::pointer_capable();
        assert!(platform.supports_pointer_hover());
    }
}
