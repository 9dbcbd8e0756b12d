use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use shared::Child as SharedChild;

use crate::domain::models::child::Child as DomainChild;

/// Mapper to convert between shared Child DTOs and domain Child models.
pub struct ChildMapper;

impl ChildMapper {
    /// Converts a shared Child DTO to a domain Child model.
    pub fn to_domain(dto: SharedChild) -> Result<DomainChild> {
        let created_at = DateTime::parse_from_rfc3339(&dto.created_at)
            .context("Failed to parse created_at from shared DTO")?
            .with_timezone(&Utc);
        let updated_at = DateTime::parse_from_rfc3339(&dto.updated_at)
            .context("Failed to parse updated_at from shared DTO")?
            .with_timezone(&Utc);

        Ok(DomainChild {
            id: dto.id,
            name: dto.name,
            color_tag: dto.color_tag,
            total_points: dto.total_points,
            is_archived: dto.is_archived,
            last_gold_star_day: None,
            created_at,
            updated_at,
        })
    }

    /// Converts a domain Child model to a shared Child DTO.
    pub fn to_dto(domain: DomainChild) -> SharedChild {
        SharedChild {
            id: domain.id,
            name: domain.name,
            color_tag: domain.color_tag,
            total_points: domain.total_points,
            is_archived: domain.is_archived,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_dto_list(children: Vec<DomainChild>) -> Vec<SharedChild> {
        children.into_iter().map(Self::to_dto).collect()
    }
}
