use std::path::{Path, PathBuf};

/// Icon assets shipped next to the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Sun,
    Moon,
    PartlySunny,
    PartlyMoon,
    Cloud,
    Rain,
    Snow,
    Haze,
    Storm,
    Wind,
    Tornado,
    Hail,
    Newspaper,
}

impl Icon {
    pub const ALL: [Icon; 13] = [
        Icon::Sun,
        Icon::Moon,
        Icon::PartlySunny,
        Icon::PartlyMoon,
        Icon::Cloud,
        Icon::Rain,
        Icon::Snow,
        Icon::Haze,
        Icon::Storm,
        Icon::Wind,
        Icon::Tornado,
        Icon::Hail,
        Icon::Newspaper,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Icon::Sun => "Sun.png",
            Icon::Moon => "Moon.png",
            Icon::PartlySunny => "PartlySunny.png",
            Icon::PartlyMoon => "PartlyMoon.png",
            Icon::Cloud => "Cloud.png",
            Icon::Rain => "Rain.png",
            Icon::Snow => "Snow.png",
            Icon::Haze => "Haze.png",
            Icon::Storm => "Storm.png",
            Icon::Wind => "Wind.png",
            Icon::Tornado => "Tornado.png",
            Icon::Hail => "Hail.png",
            Icon::Newspaper => "Newspaper.png",
        }
    }

    pub fn asset_path(&self, assets_dir: &Path) -> PathBuf {
        assets_dir.join(self.file_name())
    }

    /// Stand-in for surfaces that draw text only.
    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::Sun => "☀",
            Icon::Moon => "☾",
            Icon::PartlySunny => "⛅",
            Icon::PartlyMoon => "☁☾",
            Icon::Cloud => "☁",
            Icon::Rain => "☂",
            Icon::Snow => "❄",
            Icon::Haze => "≋",
            Icon::Storm => "ϟ",
            Icon::Wind => "≈",
            Icon::Tornado => "🌪",
            Icon::Hail => "☄",
            Icon::Newspaper => "▪",
        }
    }
}

/// Icon for an OpenWeatherMap icon code (`01d`, `10n`, ...).
///
/// `wind`, `tornado` and `hail` have no OpenWeatherMap code but are kept so a
/// different provider can reuse the same assets. Unknown codes get no icon.
pub fn icon_for_code(code: &str) -> Option<Icon> {
    let icon = match code {
        "01d" => Icon::Sun,
        "01n" => Icon::Moon,
        "02d" | "04d" => Icon::PartlySunny,
        "02n" | "03n" | "04n" => Icon::PartlyMoon,
        "03d" => Icon::Cloud,
        "09d" | "09n" | "10d" | "10n" => Icon::Rain,
        "13d" | "13n" => Icon::Snow,
        "50d" | "50n" => Icon::Haze,
        "11d" | "11n" => Icon::Storm,
        "wind" => Icon::Wind,
        "tornado" => Icon::Tornado,
        "hail" => Icon::Hail,
        _ => return None,
    };
    Some(icon)
}

/// Asset files absent from `assets_dir`.
pub fn missing_assets(assets_dir: &Path) -> Vec<PathBuf> {
    Icon::ALL
        .iter()
        .map(|icon| icon.asset_path(assets_dir))
        .filter(|path| !path.is_file())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_resolve_to_fixed_assets() {
        let assets = Path::new("assets");
        assert_eq!(
            icon_for_code("01d").map(|i| i.asset_path(assets)),
            Some(PathBuf::from("assets/Sun.png"))
        );
        assert_eq!(
            icon_for_code("03n").map(|i| i.asset_path(assets)),
            Some(PathBuf::from("assets/PartlyMoon.png"))
        );
        assert_eq!(icon_for_code("10n"), Some(Icon::Rain));
        assert_eq!(icon_for_code("11d"), Some(Icon::Storm));
    }

    #[test]
    fn test_lookup_is_stable() {
        for code in ["01d", "02n", "09d", "13n", "50d", "hail"] {
            assert_eq!(icon_for_code(code), icon_for_code(code));
        }
    }

    #[test]
    fn test_unmapped_codes_have_no_icon() {
        assert_eq!(icon_for_code("99x"), None);
        assert_eq!(icon_for_code(""), None);
        assert_eq!(icon_for_code("01D"), None);
    }

    #[test]
    fn test_missing_assets() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(missing_assets(dir.path()).len(), Icon::ALL.len());

        for icon in Icon::ALL.iter().filter(|i| **i != Icon::Hail) {
            std::fs::write(icon.asset_path(dir.path()), b"png").unwrap();
        }
        assert_eq!(missing_assets(dir.path()), vec![dir.path().join("Hail.png")]);
    }
}
