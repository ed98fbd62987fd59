use crate::entities::{media_assignments, prelude::*};
use crate::models::assignment::{
    AssignedMediaType, AssignmentInput, AssignmentStatus, HistoryEntry, MediaAssignment,
};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{decode_list, encode, now};

pub struct AssignmentRepository {
    conn: DatabaseConnection,
}

impl AssignmentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: media_assignments::Model) -> MediaAssignment {
        MediaAssignment {
            id: m.id,
            user_id: m.user_id,
            file_id: m.file_id,
            media_type: if m.media_type == "episode" {
                AssignedMediaType::Episode
            } else {
                AssignedMediaType::Movie
            },
            media_id: m.media_id,
            series_id: m.series_id,
            season_number: m.season_number,
            version: m.version,
            status: m.status.parse().unwrap_or(AssignmentStatus::Assigned),
            is_organized: m.is_organized,
            target_path: m.target_path,
            source_file: serde_json::from_str(&m.source_file).unwrap_or_default(),
            organization_history: decode_list(&m.organization_history),
            date_assigned: m.date_assigned,
            date_organized: m.date_organized,
        }
    }

    pub async fn add(&self, input: &AssignmentInput) -> Result<MediaAssignment> {
        let model = media_assignments::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(input.user_id.clone()),
            file_id: Set(input.file_id.clone()),
            media_type: Set(input.media_type.as_str().to_string()),
            media_id: Set(input.media_id.clone()),
            series_id: Set(input.series_id.clone()),
            season_number: Set(input.season_number),
            version: Set(input.version.clone()),
            status: Set(AssignmentStatus::Assigned.as_str().to_string()),
            is_organized: Set(false),
            target_path: Set(None),
            source_file: Set(encode(&input.source_file)),
            organization_history: Set("[]".to_string()),
            date_assigned: Set(now()),
            date_organized: Set(None),
        };
        let inserted = model.insert(&self.conn).await?;
        Ok(Self::map_model(inserted))
    }

    pub async fn get(&self, id: &str) -> Result<Option<MediaAssignment>> {
        let row = MediaAssignments::find_by_id(id.to_string())
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn list_for_media(&self, media_id: &str) -> Result<Vec<MediaAssignment>> {
        let rows = MediaAssignments::find()
            .filter(media_assignments::Column::MediaId.eq(media_id))
            .order_by_asc(media_assignments::Column::DateAssigned)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Persists status, organization state and history of an assignment.
    pub async fn save_progress(&self, assignment: &MediaAssignment) -> Result<MediaAssignment> {
        let model = media_assignments::ActiveModel {
            id: Set(assignment.id.clone()),
            status: Set(assignment.status.as_str().to_string()),
            is_organized: Set(assignment.is_organized),
            target_path: Set(assignment.target_path.clone()),
            organization_history: Set(encode(&assignment.organization_history)),
            date_organized: Set(assignment.date_organized.clone()),
            ..Default::default()
        };
        let updated = model.update(&self.conn).await?;
        Ok(Self::map_model(updated))
    }

    pub async fn update(
        &self,
        id: &str,
        status: Option<AssignmentStatus>,
        history: Option<&[HistoryEntry]>,
    ) -> Result<Option<MediaAssignment>> {
        let Some(existing) = MediaAssignments::find_by_id(id.to_string())
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let mut model: media_assignments::ActiveModel = existing.into();
        if let Some(status) = status {
            model.status = Set(status.as_str().to_string());
            model.is_organized = Set(status == AssignmentStatus::Organized);
        }
        if let Some(history) = history {
            model.organization_history = Set(encode(history));
        }
        let updated = model.update(&self.conn).await?;
        Ok(Some(Self::map_model(updated)))
    }
}
