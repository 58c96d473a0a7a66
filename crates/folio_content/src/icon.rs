//! Service icons
//!
//! Content names icons by their Lucide key. Unknown keys render as
//! [`Icon::Code`].

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Icon {
    #[default]
    Code,
    Layers,
    Database,
    Zap,
    Cloud,
    Server,
    Smartphone,
    Palette,
    Shield,
    Cpu,
    Globe,
    Terminal,
}

impl Icon {
    pub const ALL: [Icon; 12] = [
        Icon::Code,
        Icon::Layers,
        Icon::Database,
        Icon::Zap,
        Icon::Cloud,
        Icon::Server,
        Icon::Smartphone,
        Icon::Palette,
        Icon::Shield,
        Icon::Cpu,
        Icon::Globe,
        Icon::Terminal,
    ];

    /// Lucide component name
    pub fn key(self) -> &'static str {
        match self {
            Icon::Code => "Code",
            Icon::Layers => "Layers",
            Icon::Database => "Database",
            Icon::Zap => "Zap",
            Icon::Cloud => "Cloud",
            Icon::Server => "Server",
            Icon::Smartphone => "Smartphone",
            Icon::Palette => "Palette",
            Icon::Shield => "Shield",
            Icon::Cpu => "Cpu",
            Icon::Globe => "Globe",
            Icon::Terminal => "Terminal",
        }
    }

    /// Exact lookup; `None` for keys outside the table
    pub fn lookup(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|icon| icon.key() == key)
    }

    /// Lookup with the `Code` fallback
    pub fn from_key(key: &str) -> Self {
        Self::lookup(key).unwrap_or_else(|| {
            tracing::warn!("Icon: unknown key `{}`, using Code", key);
            Icon::Code
        })
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys() {
        assert_eq!(Icon::from_key("Layers"), Icon::Layers);
        assert_eq!(Icon::from_key("Zap"), Icon::Zap);
        for icon in Icon::ALL {
            assert_eq!(Icon::lookup(icon.key()), Some(icon));
        }
    }

    #[test]
    fn test_unknown_key_falls_back() {
        assert_eq!(Icon::lookup("Rocket"), None);
        assert_eq!(Icon::from_key("Rocket"), Icon::Code);
        // Keys are case sensitive
        assert_eq!(Icon::from_key("layers"), Icon::Code);
    }
}
