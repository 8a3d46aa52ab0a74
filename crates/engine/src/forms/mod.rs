//! Promotion page forms built on the engine.
use std::{fmt, str::FromStr};

use crate::{FormError, FormSpec};

pub mod banner;
pub mod campaign_reward;
pub mod promo_code;
pub mod turn_on_discount;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormKind {
    PromoCode,
    CampaignReward,
    Banner,
    TurnOnDiscount,
}

impl FormKind {
    pub const ALL: [FormKind; 4] = [
        Self::PromoCode,
        Self::CampaignReward,
        Self::Banner,
        Self::TurnOnDiscount,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PromoCode => "promo-code",
            Self::CampaignReward => "campaign-reward",
            Self::Banner => "banner",
            Self::TurnOnDiscount => "turn-on-discount",
        }
    }

    pub const fn resource(self) -> &'static str {
        match self {
            Self::PromoCode => promo_code::RESOURCE,
            Self::CampaignReward => campaign_reward::RESOURCE,
            Self::Banner => banner::RESOURCE,
            Self::TurnOnDiscount => turn_on_discount::RESOURCE,
        }
    }

    pub fn spec(self) -> Result<FormSpec, FormError> {
        match self {
            Self::PromoCode => promo_code::spec(),
            Self::CampaignReward => campaign_reward::spec(),
            Self::Banner => banner::spec(),
            Self::TurnOnDiscount => turn_on_discount::spec(),
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FormError::Configuration(format!("unknown form {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_form_spec_builds() {
        for kind in FormKind::ALL {
            let spec = kind.spec().unwrap();
            assert_eq!(spec.resource, kind.resource());
        }
    }

    #[test]
    fn kinds_parse_from_their_names() {
        assert_eq!("banner".parse::<FormKind>().unwrap(), FormKind::Banner);
        assert!("drivers".parse::<FormKind>().is_err());
    }
}
