//! Vehicle/freight compatibility.
//!
//! The backend reports vehicle and body types as free-form labels, and
//! freights may ask for a weight category instead of explicit vehicle types.
//! Everything is resolved here through two tables: [`VEHICLE_ALIASES`] maps
//! labels onto [`VehicleType`], and [`FreightCategory::accepted_vehicles`]
//! maps categories onto the vehicle types that can carry them.

use serde::{Deserialize, Serialize};

use crate::responses::{Freight, Vehicle};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    /// Veículo urbano de carga.
    Vuc,
    /// "3/4" light truck.
    TresQuartos,
    Toco,
    Truck,
    Bitruck,
    Carreta,
    CarretaLs,
    Bitrem,
    Rodotrem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Bau,
    Sider,
    Graneleiro,
    Cacamba,
    Frigorifico,
    Tanque,
    Prancha,
    PortaContainer,
}

/// Weight class a company can request instead of naming vehicle types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FreightCategory {
    Light,
    Medium,
    Heavy,
    ExtraHeavy,
}

/// Every label the backend and older clients are known to use for each
/// vehicle type. Labels are compared after [`normalize_label`].
pub const VEHICLE_ALIASES: &[(&str, VehicleType)] = &[
    ("vuc", VehicleType::Vuc),
    ("veiculo urbano de carga", VehicleType::Vuc),
    ("3/4", VehicleType::TresQuartos),
    ("tres quartos", VehicleType::TresQuartos),
    ("tres_quartos", VehicleType::TresQuartos),
    ("3_4", VehicleType::TresQuartos),
    ("toco", VehicleType::Toco),
    ("truck", VehicleType::Truck),
    ("caminhao truck", VehicleType::Truck),
    ("bitruck", VehicleType::Bitruck),
    ("bi-truck", VehicleType::Bitruck),
    ("carreta", VehicleType::Carreta),
    ("semi-reboque", VehicleType::Carreta),
    ("carreta ls", VehicleType::CarretaLs),
    ("carreta_ls", VehicleType::CarretaLs),
    ("ls", VehicleType::CarretaLs),
    ("bitrem", VehicleType::Bitrem),
    ("bi-trem", VehicleType::Bitrem),
    ("rodotrem", VehicleType::Rodotrem),
];

pub const BODY_ALIASES: &[(&str, BodyType)] = &[
    ("bau", BodyType::Bau),
    ("furgao", BodyType::Bau),
    ("sider", BodyType::Sider),
    ("graneleiro", BodyType::Graneleiro),
    ("grade baixa", BodyType::Graneleiro),
    ("cacamba", BodyType::Cacamba),
    ("basculante", BodyType::Cacamba),
    ("frigorifico", BodyType::Frigorifico),
    ("refrigerado", BodyType::Frigorifico),
    ("bau frigorifico", BodyType::Frigorifico),
    ("tanque", BodyType::Tanque),
    ("prancha", BodyType::Prancha),
    ("porta container", BodyType::PortaContainer),
    ("porta_container", BodyType::PortaContainer),
    ("porta-container", BodyType::PortaContainer),
];

/// Lowercase, trim and strip the Portuguese accents that show up in labels.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'a',
            'é' | 'ê' | 'É' | 'Ê' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'o',
            'ú' | 'Ú' => 'u',
            'ç' | 'Ç' => 'c',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl VehicleType {
    pub fn from_label(label: &str) -> Option<Self> {
        let label = normalize_label(label);
        VEHICLE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == label)
            .map(|(_, vehicle_type)| *vehicle_type)
    }
}

impl BodyType {
    pub fn from_label(label: &str) -> Option<Self> {
        let label = normalize_label(label);
        BODY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == label)
            .map(|(_, body_type)| *body_type)
    }
}

// Incoming labels go through the alias tables so every spelling the backend
// has used deserializes to the same variant.
impl<'de> Deserialize<'de> for VehicleType {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::from_label(&label).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown vehicle type: {label}"))
        })
    }
}

impl<'de> Deserialize<'de> for BodyType {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::from_label(&label).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown body type: {label}"))
        })
    }
}

impl FreightCategory {
    pub fn accepted_vehicles(&self) -> &'static [VehicleType] {
        use VehicleType::*;
        match self {
            Self::Light => &[Vuc, TresQuartos],
            Self::Medium => &[TresQuartos, Toco, Truck],
            Self::Heavy => &[Truck, Bitruck, Carreta, CarretaLs],
            Self::ExtraHeavy => &[Carreta, CarretaLs, Bitrem, Rodotrem],
        }
    }
}

/// Whether `vehicle` can carry `freight`.
///
/// Explicit vehicle types on the freight take precedence over its category.
/// Empty requirement lists accept anything. A vehicle whose capacity is
/// known must be able to carry the freight's weight when that is known too.
pub fn is_compatible(vehicle: &Vehicle, freight: &Freight) -> bool {
    let accepted_vehicle = if !freight.vehicle_types.is_empty() {
        freight.vehicle_types.contains(&vehicle.vehicle_type)
    } else if let Some(category) = freight.category {
        category.accepted_vehicles().contains(&vehicle.vehicle_type)
    } else {
        true
    };
    if !accepted_vehicle {
        return false;
    }

    if !freight.body_types.is_empty()
        && !freight.body_types.contains(&vehicle.body_type)
    {
        return false;
    }

    match (vehicle.capacity_kg, freight.weight_kg) {
        (Some(capacity), Some(weight)) => capacity >= weight,
        _ => true,
    }
}

/// Freights that at least one of `vehicles` can carry, in input order.
pub fn compatible_freights<'a>(
    vehicles: &[Vehicle],
    freights: &'a [Freight],
) -> Vec<&'a Freight> {
    freights
        .iter()
        .filter(|freight| {
            vehicles.iter().any(|vehicle| is_compatible(vehicle, freight))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FreightId, FreightStatus, Location, VehicleId};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn vehicle(vehicle_type: VehicleType, body_type: BodyType) -> Vehicle {
        Vehicle {
            id: VehicleId(Uuid::new_v4()),
            plate: "ABC1D23".into(),
            vehicle_type,
            body_type,
            capacity_kg: Some(Decimal::from(14_000)),
        }
    }

    fn freight() -> Freight {
        Freight {
            id: FreightId(Uuid::new_v4()),
            company_id: None,
            title: "Soja a granel".into(),
            origin: Location {
                city: "Sorriso".into(),
                state: "MT".into(),
            },
            destination: Location {
                city: "Santos".into(),
                state: "SP".into(),
            },
            status: FreightStatus::Open,
            price: Decimal::from(9_500),
            weight_kg: Some(Decimal::from(12_000)),
            category: None,
            vehicle_types: vec![],
            body_types: vec![],
            created_at: None,
        }
    }

    #[test]
    fn labels_resolve_through_alias_table() {
        assert_eq!(VehicleType::from_label(" 3/4 "), Some(VehicleType::TresQuartos));
        assert_eq!(VehicleType::from_label("Bi-Trem"), Some(VehicleType::Bitrem));
        assert_eq!(BodyType::from_label("Baú"), Some(BodyType::Bau));
        assert_eq!(
            BodyType::from_label("Frigorífico"),
            Some(BodyType::Frigorifico)
        );
        assert_eq!(VehicleType::from_label("helicóptero"), None);
    }

    #[test]
    fn deserializes_legacy_labels() {
        let parsed: Vec<VehicleType> =
            serde_json::from_str(r#"["Carreta LS", "tres_quartos", "VUC"]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![VehicleType::CarretaLs, VehicleType::TresQuartos, VehicleType::Vuc]
        );
        assert!(serde_json::from_str::<BodyType>(r#""balão""#).is_err());
    }

    #[test]
    fn unrestricted_freight_accepts_any_vehicle_with_capacity() {
        let f = freight();
        assert!(is_compatible(&vehicle(VehicleType::Truck, BodyType::Bau), &f));

        let mut small = vehicle(VehicleType::Vuc, BodyType::Bau);
        small.capacity_kg = Some(Decimal::from(3_000));
        assert!(!is_compatible(&small, &f));

        small.capacity_kg = None;
        assert!(is_compatible(&small, &f));
    }

    #[test]
    fn explicit_vehicle_types_override_category() {
        let mut f = freight();
        f.category = Some(FreightCategory::Light);
        f.vehicle_types = vec![VehicleType::Carreta];

        assert!(is_compatible(&vehicle(VehicleType::Carreta, BodyType::Sider), &f));
        assert!(!is_compatible(&vehicle(VehicleType::Vuc, BodyType::Sider), &f));
    }

    #[test]
    fn category_uses_canonical_table() {
        let mut f = freight();
        f.weight_kg = None;
        f.category = Some(FreightCategory::ExtraHeavy);

        assert!(is_compatible(&vehicle(VehicleType::Rodotrem, BodyType::Graneleiro), &f));
        assert!(!is_compatible(&vehicle(VehicleType::Toco, BodyType::Graneleiro), &f));
    }

    #[test]
    fn body_type_must_match_when_required() {
        let mut f = freight();
        f.body_types = vec![BodyType::Frigorifico];

        assert!(!is_compatible(&vehicle(VehicleType::Truck, BodyType::Bau), &f));
        assert!(is_compatible(&vehicle(VehicleType::Truck, BodyType::Frigorifico), &f));
    }

    #[test]
    fn compatible_freights_keeps_order_and_dedups_across_vehicles() {
        let mut refrigerated = freight();
        refrigerated.body_types = vec![BodyType::Frigorifico];
        let open = freight();
        let mut heavy = freight();
        heavy.vehicle_types = vec![VehicleType::Bitrem];

        let freights = vec![refrigerated.clone(), open.clone(), heavy];
        let vehicles = vec![
            vehicle(VehicleType::Truck, BodyType::Bau),
            vehicle(VehicleType::Truck, BodyType::Frigorifico),
        ];

        let ids: Vec<_> = compatible_freights(&vehicles, &freights)
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![refrigerated.id, open.id]);
    }
}
