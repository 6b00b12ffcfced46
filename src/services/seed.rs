use log::warn;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    models::{ItemType, Role},
    store::{NewItem, NewParentItem, NewRoom, NewUser, Store},
    utils::hash_password,
};

#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub buildings: usize,
    pub rooms: usize,
    pub parent_items: usize,
    pub items: usize,
}

const USERS: [(&str, &str, &str, Role); 2] = [
    ("Admin", "admin@inventory.com", "admin", Role::Admin),
    ("Stella Grant", "custodian1@inventory.com", "password", Role::Custodian),
];

const BUILDINGS: [&str; 3] = ["Building 1", "Building 2", "Building 3"];

const ROOMS: [(&str, &str); 4] = [
    ("Room 101", "Room"),
    ("Room 102", "Room"),
    ("Lab 201", "Lab"),
    ("Lab 202", "Lab"),
];

const PARENT_ITEMS: [(&str, ItemType, &str); 2] = [
    ("Desktop", ItemType::Pc, "Generic"),
    ("Chair", ItemType::Fixture, "Monobloc"),
];

const INSTANCES_PER_PARENT: usize = 2;

fn random_serial() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_uppercase()
}

/// Wipes every table and loads the fixed development data set.
pub async fn reseed(store: &dyn Store, config: &Config) -> Result<SeedSummary, AppError> {
    warn!("Reseeding database: all existing rows are deleted");
    store.truncate_all().await?;

    let mut custodian_id = None;
    for (name, email, password, role) in USERS {
        let password_hash = hash_password(password, config.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;
        let user = store
            .insert_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await?;
        if role == Role::Custodian {
            custodian_id = Some(user.id);
        }
    }

    let mut building_ids = Vec::new();
    for name in BUILDINGS {
        building_ids.push(store.insert_building(name).await?.id);
    }

    for (name, room_type) in ROOMS {
        store
            .insert_room(NewRoom {
                name: name.to_string(),
                room_type: room_type.to_string(),
                building_id: None,
            })
            .await?;
    }

    for (name, item_type, brand) in PARENT_ITEMS {
        let parent = store
            .insert_parent_item(NewParentItem {
                name: name.to_string(),
                item_type,
                description: None,
            })
            .await?;
        for _ in 0..INSTANCES_PER_PARENT {
            store
                .insert_item(NewItem {
                    parent_item_id: parent.id,
                    serial_number: random_serial(),
                    brand: brand.to_string(),
                    room_id: None,
                    remarks: None,
                })
                .await?;
        }
    }

    if let (Some(custodian_id), Some(first_building)) = (custodian_id, building_ids.first()) {
        store
            .set_custodian_buildings(custodian_id, &[*first_building])
            .await?;
    }

    Ok(SeedSummary {
        users: USERS.len(),
        buildings: BUILDINGS.len(),
        rooms: ROOMS.len(),
        parent_items: PARENT_ITEMS.len(),
        items: PARENT_ITEMS.len() * INSTANCES_PER_PARENT,
    })
}
