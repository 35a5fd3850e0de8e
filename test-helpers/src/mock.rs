//! Canned marketplace data for tests
//!
//! One company (Transportes Alfa) with freights in every status, one driver
//! with two vehicles, and the admin's view of the platform. Open freights are
//! chosen so that the driver's vehicles can carry some of them but not all.

use jiff::Timestamp;
use payloads::matching::{BodyType, FreightCategory, VehicleType};
use payloads::responses::{
    CompanyStats, Freight, FreightInterest, PlatformStats, UserSummary,
    Vehicle,
};
use payloads::{
    CompanyId, FreightId, FreightStatus, InterestId, InterestStatus, Location,
    Role, UserId, VehicleId,
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct MockDataset {
    pub company_id: CompanyId,
    /// Every freight of the company, in all statuses.
    pub company_freights: Vec<Freight>,
    /// What the public listing returns: the company's open freights.
    pub open_freights: Vec<Freight>,
    pub vehicles: Vec<Vehicle>,
    pub interests: Vec<FreightInterest>,
    pub users: Vec<UserSummary>,
    pub company_stats: CompanyStats,
    pub platform_stats: PlatformStats,
}

impl Default for MockDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataset {
    pub fn new() -> Self {
        let company_id = CompanyId(Uuid::new_v4());

        let company_freights = vec![
            // light load, any vehicle able to carry a light category
            freight(
                company_id,
                "Eletrônicos Campinas",
                ("Campinas", "SP"),
                ("Curitiba", "PR"),
                FreightStatus::Open,
                2_500,
                |f| f.category = Some(FreightCategory::Light),
            ),
            // grain needs a graneleiro body on a heavy vehicle
            freight(
                company_id,
                "Soja Rio Verde",
                ("Rio Verde", "GO"),
                ("Santos", "SP"),
                FreightStatus::Open,
                9_800,
                |f| {
                    f.category = Some(FreightCategory::ExtraHeavy);
                    f.body_types = vec![BodyType::Graneleiro];
                },
            ),
            freight(
                company_id,
                "Móveis Bento Gonçalves",
                ("Bento Gonçalves", "RS"),
                ("Porto Alegre", "RS"),
                FreightStatus::Open,
                1_900,
                |f| f.vehicle_types = vec![VehicleType::Truck, VehicleType::Toco],
            ),
            freight(
                company_id,
                "Bebidas Jundiaí",
                ("Jundiaí", "SP"),
                ("Belo Horizonte", "MG"),
                FreightStatus::Negotiating,
                4_200,
                |_| {},
            ),
            freight(
                company_id,
                "Cimento Sete Lagoas",
                ("Sete Lagoas", "MG"),
                ("Brasília", "DF"),
                FreightStatus::InTransit,
                6_100,
                |_| {},
            ),
            freight(
                company_id,
                "Papel Mogi",
                ("Mogi das Cruzes", "SP"),
                ("Rio de Janeiro", "RJ"),
                FreightStatus::Delivered,
                3_300,
                |_| {},
            ),
            freight(
                company_id,
                "Frutas Petrolina",
                ("Petrolina", "PE"),
                ("Salvador", "BA"),
                FreightStatus::Cancelled,
                5_000,
                |_| {},
            ),
        ];
        let open_freights = company_freights
            .iter()
            .filter(|f| f.status == FreightStatus::Open)
            .cloned()
            .collect();

        let vehicles = vec![
            Vehicle {
                id: VehicleId(Uuid::new_v4()),
                plate: "ABC1D23".into(),
                vehicle_type: VehicleType::TresQuartos,
                body_type: BodyType::Bau,
                capacity_kg: Some(Decimal::from(4_000)),
            },
            Vehicle {
                id: VehicleId(Uuid::new_v4()),
                plate: "XYZ9K87".into(),
                vehicle_type: VehicleType::Truck,
                body_type: BodyType::Sider,
                capacity_kg: Some(Decimal::from(14_000)),
            },
        ];

        let interests = vec![FreightInterest {
            id: InterestId(Uuid::new_v4()),
            freight_id: company_freights[0].id,
            status: InterestStatus::Pending,
            message: Some("Posso carregar amanhã cedo".into()),
            created_at: created_at(),
        }];

        let users = vec![
            user("Transportes Alfa", "contato@alfa.com.br", Role::Company),
            user("João Motorista", "joao@example.com", Role::Driver),
            user("Maria Motorista", "maria@example.com", Role::Driver),
            user("Admin", "admin@starfrete.com.br", Role::Admin),
        ];

        let company_stats = CompanyStats {
            total_freights: 7,
            active_freights: 5,
            completed_freights: 1,
            pending_interests: 1,
            total_spent: Decimal::from(3_300),
        };
        let platform_stats = PlatformStats {
            total_users: 4,
            total_companies: 1,
            total_drivers: 2,
            total_freights: 7,
            open_freights: 3,
        };

        Self {
            company_id,
            company_freights,
            open_freights,
            vehicles,
            interests,
            users,
            company_stats,
            platform_stats,
        }
    }

    /// Open freight a vehicle of the dataset can carry.
    pub fn carriable_freight(&self) -> &Freight {
        &self.open_freights[0]
    }
}

fn created_at() -> Timestamp {
    "2025-01-01T12:00:00Z".parse().unwrap()
}

fn freight(
    company_id: CompanyId,
    title: &str,
    origin: (&str, &str),
    destination: (&str, &str),
    status: FreightStatus,
    price: i64,
    customize: impl FnOnce(&mut Freight),
) -> Freight {
    let mut freight = Freight {
        id: FreightId(Uuid::new_v4()),
        company_id: Some(company_id),
        title: title.into(),
        origin: location(origin),
        destination: location(destination),
        status,
        price: Decimal::from(price),
        weight_kg: None,
        category: None,
        vehicle_types: Vec::new(),
        body_types: Vec::new(),
        created_at: Some(created_at()),
    };
    customize(&mut freight);
    freight
}

fn location((city, state): (&str, &str)) -> Location {
    Location {
        city: city.into(),
        state: state.into(),
    }
}

fn user(name: &str, email: &str, role: Role) -> UserSummary {
    UserSummary {
        user_id: UserId(Uuid::new_v4()),
        name: name.into(),
        email: email.into(),
        role,
        is_active: true,
    }
}
