use super::{PostgresClient, PostgresError};
use crate::core::DiscoveryFilters;
use crate::models::{BoundingBox, LocationCount, Profile, ProfileUpdateRequest, SavedProfile};

/// Visible, not the viewer, and no block in either direction
const VISIBLE_TO_VIEWER: &str = r#"
    p.is_visible = TRUE
    AND p.user_id <> $1
    AND NOT EXISTS (
        SELECT 1 FROM blocks b
        WHERE (b.blocker_id = $1 AND b.blocked_id = p.user_id)
           OR (b.blocker_id = p.user_id AND b.blocked_id = $1)
    )
"#;

/// Longitude predicate for a box that may wrap across the antimeridian
fn longitude_in_box(min: &str, max: &str) -> String {
    format!(
        "(({min}::float8 <= {max}::float8 AND p.longitude BETWEEN {min} AND {max}) \
         OR ({min}::float8 > {max}::float8 AND (p.longitude >= {min} OR p.longitude <= {max})))",
        min = min,
        max = max,
    )
}

impl PostgresClient {
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, PostgresError> {
        Ok(sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_profile_by_id(&self, id: i64) -> Result<Option<Profile>, PostgresError> {
        Ok(sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Apply a partial update, creating the profile first if needed
    ///
    /// `displayName` is stored on the user row in the same transaction.
    pub async fn upsert_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdateRequest,
    ) -> Result<Profile, PostgresError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles SET
                bio = COALESCE($2, bio),
                niche = COALESCE($3, niche),
                portfolio_url = COALESCE($4, portfolio_url),
                location = COALESCE($5, location),
                social_links = COALESCE($6, social_links),
                tags = COALESCE($7, tags),
                is_nsfw = COALESCE($8, is_nsfw),
                birth_date = COALESCE($9, birth_date),
                gender = COALESCE($10, gender),
                looking_for = COALESCE($11, looking_for),
                interests = COALESCE($12, interests),
                height = COALESCE($13, height),
                occupation = COALESCE($14, occupation),
                education = COALESCE($15, education),
                photos = COALESCE($16, photos),
                is_visible = COALESCE($17, is_visible),
                privacy_settings = COALESCE($18, privacy_settings),
                min_age_preference = COALESCE($19, min_age_preference),
                max_age_preference = COALESCE($20, max_age_preference),
                max_distance = COALESCE($21, max_distance),
                gender_preference = COALESCE($22, gender_preference),
                boundaries = COALESCE($23, boundaries),
                experience_level = COALESCE($24, experience_level),
                availability = COALESCE($25, availability),
                travel_mode = COALESCE($26, travel_mode),
                monetization_expectation = COALESCE($27, monetization_expectation),
                last_active = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&update.bio)
        .bind(&update.niche)
        .bind(&update.portfolio_url)
        .bind(&update.location)
        .bind(&update.social_links)
        .bind(&update.tags)
        .bind(update.is_nsfw)
        .bind(update.birth_date)
        .bind(&update.gender)
        .bind(&update.looking_for)
        .bind(&update.interests)
        .bind(update.height)
        .bind(&update.occupation)
        .bind(&update.education)
        .bind(&update.photos)
        .bind(update.is_visible)
        .bind(&update.privacy_settings)
        .bind(update.min_age_preference)
        .bind(update.max_age_preference)
        .bind(update.max_distance)
        .bind(&update.gender_preference)
        .bind(&update.boundaries)
        .bind(&update.experience_level)
        .bind(&update.availability)
        .bind(&update.travel_mode)
        .bind(&update.monetization_expectation)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(display_name) = &update.display_name {
            sqlx::query("UPDATE users SET display_name = $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(display_name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!("Updated profile for user {}", user_id);
        Ok(profile)
    }

    /// Location check-in
    pub async fn update_location(
        &self,
        user_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Profile, PostgresError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, latitude, longitude, location_updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                location_updated_at = EXCLUDED.location_updated_at,
                last_active = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn touch_last_active(&self, user_id: &str) -> Result<(), PostgresError> {
        sqlx::query("UPDATE profiles SET last_active = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Directory listing of profiles the viewer may see
    pub async fn list_visible_profiles(
        &self,
        viewer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>, PostgresError> {
        let query = format!(
            "SELECT p.* FROM profiles p WHERE {} ORDER BY p.last_active DESC LIMIT $2 OFFSET $3",
            VISIBLE_TO_VIEWER
        );
        Ok(sqlx::query_as::<_, Profile>(&query)
            .bind(viewer_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Discovery candidates: visible, unblocked, not yet liked and not in the seen list
    ///
    /// The niche and any-of filters run here, before the pool is capped, as does
    /// the bounding box when one is given. Profiles without coordinates pass the box.
    pub async fn discovery_candidates(
        &self,
        viewer_id: &str,
        filters: &DiscoveryFilters,
        bbox: Option<&BoundingBox>,
        limit: i64,
    ) -> Result<Vec<Profile>, PostgresError> {
        let query = format!(
            r#"
            SELECT p.* FROM profiles p
            WHERE {}
              AND NOT EXISTS (SELECT 1 FROM likes l WHERE l.liker_id = $1 AND l.liked_id = p.user_id)
              AND NOT EXISTS (SELECT 1 FROM seen_profiles s WHERE s.user_id = $1 AND s.target_user_id = p.user_id)
              AND ($2::text IS NULL OR LOWER(TRIM(p.niche)) = $2)
              AND (cardinality($3::text[]) = 0 OR LOWER(TRIM(p.experience_level)) = ANY($3))
              AND (cardinality($4::text[]) = 0 OR LOWER(TRIM(p.availability)) = ANY($4))
              AND (cardinality($5::text[]) = 0 OR LOWER(TRIM(p.travel_mode)) = ANY($5))
              AND (cardinality($6::text[]) = 0 OR LOWER(TRIM(p.monetization_expectation)) = ANY($6))
              AND (
                  $7::float8 IS NULL
                  OR p.latitude IS NULL
                  OR p.longitude IS NULL
                  OR (p.latitude BETWEEN $7 AND $8::float8 AND {})
              )
            ORDER BY p.last_active DESC
            LIMIT $11
            "#,
            VISIBLE_TO_VIEWER,
            longitude_in_box("$9", "$10"),
        );

        let candidates = sqlx::query_as::<_, Profile>(&query)
            .bind(viewer_id)
            .bind(&filters.content_type)
            .bind(&filters.experience_levels)
            .bind(&filters.availability)
            .bind(&filters.travel_modes)
            .bind(&filters.monetization)
            .bind(bbox.map(|b| b.min_lat))
            .bind(bbox.map(|b| b.max_lat))
            .bind(bbox.map(|b| b.min_lon))
            .bind(bbox.map(|b| b.max_lon))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Found {} discovery candidates for {}", candidates.len(), viewer_id);
        Ok(candidates)
    }

    /// Profiles with coordinates inside the bounding box
    pub async fn profiles_in_bounding_box(
        &self,
        viewer_id: &str,
        bbox: &BoundingBox,
    ) -> Result<Vec<Profile>, PostgresError> {
        let query = format!(
            r#"
            SELECT p.* FROM profiles p
            WHERE {}
              AND p.latitude BETWEEN $2 AND $3
              AND {}
            "#,
            VISIBLE_TO_VIEWER,
            longitude_in_box("$4", "$5"),
        );
        Ok(sqlx::query_as::<_, Profile>(&query)
            .bind(viewer_id)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Location names with the number of visible creators in each
    pub async fn location_counts(&self) -> Result<Vec<LocationCount>, PostgresError> {
        Ok(sqlx::query_as::<_, LocationCount>(
            r#"
            SELECT location, COUNT(*) AS count
            FROM profiles
            WHERE is_visible = TRUE AND location IS NOT NULL AND location <> ''
            GROUP BY location
            ORDER BY count DESC, location ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn profiles_by_location(
        &self,
        viewer_id: &str,
        location: &str,
    ) -> Result<Vec<Profile>, PostgresError> {
        let query = format!(
            "SELECT p.* FROM profiles p WHERE {} AND LOWER(p.location) = LOWER($2) ORDER BY p.last_active DESC",
            VISIBLE_TO_VIEWER
        );
        Ok(sqlx::query_as::<_, Profile>(&query)
            .bind(viewer_id)
            .bind(location)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Profiles sharing at least one interest or tag (lowercased `keys`), most overlap first
    pub async fn profiles_with_any_interest(
        &self,
        viewer_id: &str,
        keys: &[String],
        limit: i64,
    ) -> Result<Vec<Profile>, PostgresError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            r#"
            SELECT p.* FROM profiles p
            CROSS JOIN LATERAL (
                SELECT COUNT(DISTINCT LOWER(TRIM(t.value))) AS overlap
                FROM unnest(p.interests || p.tags) AS t(value)
                WHERE LOWER(TRIM(t.value)) = ANY($2)
            ) o
            WHERE {}
              AND o.overlap > 0
            ORDER BY o.overlap DESC, p.last_active DESC
            LIMIT $3
            "#,
            VISIBLE_TO_VIEWER
        );
        Ok(sqlx::query_as::<_, Profile>(&query)
            .bind(viewer_id)
            .bind(keys)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn list_saved_profiles(&self, user_id: &str) -> Result<Vec<SavedProfile>, PostgresError> {
        Ok(sqlx::query_as::<_, SavedProfile>(
            "SELECT * FROM saved_profiles WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Profiles for the given users, in no particular order
    pub async fn profiles_for_users(&self, user_ids: &[String]) -> Result<Vec<Profile>, PostgresError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ANY($1)")
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Save a profile; saving twice is a no-op that returns the existing row
    pub async fn save_profile(&self, user_id: &str, saved_user_id: &str) -> Result<SavedProfile, PostgresError> {
        Ok(sqlx::query_as::<_, SavedProfile>(
            r#"
            INSERT INTO saved_profiles (user_id, saved_user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, saved_user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(saved_user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn unsave_profile(&self, user_id: &str, saved_user_id: &str) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM saved_profiles WHERE user_id = $1 AND saved_user_id = $2")
            .bind(user_id)
            .bind(saved_user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
