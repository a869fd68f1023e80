use crate::prelude::*;

/// Vendors whose non-discoverable model placement is known.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub enum Brand {
    Fronius,
    Sma,
    SolarEdge,
}

/// Models some vendors place at fixed offsets instead of advertising them
/// in the discoverable model chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BrandModel {
    Nameplate,
    Settings,
    Controls,
}

impl BrandModel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nameplate => "nameplate",
            Self::Settings => "settings",
            Self::Controls => "controls",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BrandAddress {
    Fixed(u16),
    NotImplemented,
}

impl Brand {
    /// Matches the common model's `Mn` register, ignoring case and padding.
    pub fn from_manufacturer(manufacturer: &str) -> Result<Self> {
        match manufacturer.trim().to_ascii_lowercase().as_str() {
            "fronius" => Ok(Self::Fronius),
            "sma" => Ok(Self::Sma),
            "solaredge" => Ok(Self::SolarEdge),
            _ => Err(SunSpecError::UnsupportedBrand(manufacturer.trim().to_string()).into()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fronius => "fronius",
            Self::Sma => "sma",
            Self::SolarEdge => "solaredge",
        }
    }

    pub fn address_of(&self, model: BrandModel) -> BrandAddress {
        use BrandAddress::*;
        use BrandModel::*;

        match (self, model) {
            // Fronius "int + SF" register map
            (Self::Fronius, Nameplate) => Fixed(40121),
            (Self::Fronius, Settings) => Fixed(40149),
            (Self::Fronius, Controls) => Fixed(40227),
            (Self::Sma, _) | (Self::SolarEdge, _) => NotImplemented,
        }
    }

    /// Like [`Brand::address_of`], but "not implemented" is an error.
    pub fn require_address(&self, model: BrandModel) -> Result<u16> {
        match self.address_of(model) {
            BrandAddress::Fixed(address) => Ok(address),
            BrandAddress::NotImplemented => Err(SunSpecError::BrandModelNotImplemented {
                brand: self.name(),
                model: model.name(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manufacturer_matching() {
        assert_eq!(Brand::from_manufacturer("Fronius").unwrap(), Brand::Fronius);
        assert_eq!(Brand::from_manufacturer(" FRONIUS ").unwrap(), Brand::Fronius);
        assert_eq!(Brand::from_manufacturer("SMA").unwrap(), Brand::Sma);
        assert_eq!(
            Brand::from_manufacturer("SolarEdge").unwrap(),
            Brand::SolarEdge
        );

        let err = Brand::from_manufacturer("Acme Solar").unwrap_err();
        assert_eq!(
            err.downcast_ref::<SunSpecError>(),
            Some(&SunSpecError::UnsupportedBrand("Acme Solar".to_string()))
        );
    }

    #[test]
    fn fronius_addresses() {
        assert_eq!(
            Brand::Fronius.address_of(BrandModel::Controls),
            BrandAddress::Fixed(40227)
        );
        assert_eq!(Brand::Fronius.require_address(BrandModel::Nameplate).unwrap(), 40121);
        assert_eq!(Brand::Fronius.require_address(BrandModel::Settings).unwrap(), 40149);
    }

    #[test]
    fn unintegrated_vendors_are_explicit() {
        for brand in [Brand::Sma, Brand::SolarEdge] {
            for model in [BrandModel::Nameplate, BrandModel::Settings, BrandModel::Controls] {
                assert_eq!(brand.address_of(model), BrandAddress::NotImplemented);
            }
        }

        let err = Brand::Sma.require_address(BrandModel::Controls).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SunSpecError>(),
            Some(&SunSpecError::BrandModelNotImplemented {
                brand: "sma",
                model: "controls"
            })
        );
    }
}
