use serde::{Deserialize, Serialize};
use tracing::debug;

/// Latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// São Paulo, used for any unregistered city.
pub const DEFAULT_COORDINATES: Coordinates = Coordinates {
    latitude: -23.5505,
    longitude: -46.6333,
};

const CITIES: [(&str, Coordinates); 7] = [
    ("São Paulo", DEFAULT_COORDINATES),
    (
        "Campinas",
        Coordinates {
            latitude: -22.9056,
            longitude: -47.0608,
        },
    ),
    (
        "Ribeirão Preto",
        Coordinates {
            latitude: -21.1775,
            longitude: -47.8103,
        },
    ),
    (
        "Piracicaba",
        Coordinates {
            latitude: -22.7253,
            longitude: -47.6493,
        },
    ),
    (
        "Londrina",
        Coordinates {
            latitude: -23.3045,
            longitude: -51.1696,
        },
    ),
    (
        "Cascavel",
        Coordinates {
            latitude: -24.9555,
            longitude: -53.4552,
        },
    ),
    (
        "Maringá",
        Coordinates {
            latitude: -23.4205,
            longitude: -51.9333,
        },
    ),
];

impl Coordinates {
    /// Coordinates of a registered city.
    pub fn lookup(city: &str) -> Option<Self> {
        CITIES
            .iter()
            .find(|(name, _)| *name == city)
            .map(|(_, coords)| *coords)
    }
}

/// Coordinates of `city`, or São Paulo's when it is not registered.
pub fn coordinates_for(city: &str) -> Coordinates {
    Coordinates::lookup(city).unwrap_or_else(|| {
        debug!("No coordinates for '{}', using São Paulo", city);
        DEFAULT_COORDINATES
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_city() {
        let campinas = coordinates_for("Campinas");
        assert_eq!(campinas.latitude, -22.9056);
        assert_eq!(campinas.longitude, -47.0608);
    }

    #[test]
    fn test_unknown_city_defaults_to_sao_paulo() {
        assert_eq!(Coordinates::lookup("Curitiba"), None);
        assert_eq!(coordinates_for("Curitiba"), DEFAULT_COORDINATES);
    }
}
