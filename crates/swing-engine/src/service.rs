//! Async front door for many athletes and many swings.
//!
//! Capacity is computed once per athlete and cached; swings run on the
//! blocking pool so a batch spreads across worker threads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use swing_core::{Anthropometry, AthleteId, Error, JointFrame, Result, SwingId};
use tokio::sync::RwLock;

use crate::analyzer::{SwingAnalysis, SwingPipeline};
use crate::capacity::CapacityRange;
use crate::config::EngineConfig;

/// Cached capacity for one athlete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub athlete_id: AthleteId,
    pub anthropometry: Anthropometry,
    pub capacity: CapacityRange,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SwingRequest {
    pub swing_id: SwingId,
    /// Registered athlete whose capacity the swing is compared against
    pub athlete_id: Option<AthleteId>,
    pub frames: Vec<JointFrame>,
}

impl SwingRequest {
    pub fn new(frames: Vec<JointFrame>) -> Self {
        Self {
            swing_id: SwingId::new(),
            athlete_id: None,
            frames,
        }
    }

    pub fn for_athlete(mut self, athlete_id: AthleteId) -> Self {
        self.athlete_id = Some(athlete_id);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingReport {
    pub swing_id: SwingId,
    pub athlete_id: Option<AthleteId>,
    pub analyzed_at: DateTime<Utc>,
    pub analysis: SwingAnalysis,
}

pub struct AnalysisService {
    pipeline: SwingPipeline,
    athletes: RwLock<HashMap<AthleteId, AthleteProfile>>,
}

impl AnalysisService {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_pipeline(SwingPipeline::new(config))
    }

    pub fn with_pipeline(pipeline: SwingPipeline) -> Self {
        Self {
            pipeline,
            athletes: RwLock::new(HashMap::new()),
        }
    }

    pub fn pipeline(&self) -> &SwingPipeline {
        &self.pipeline
    }

    /// Register or update an athlete. Capacity is recomputed only when the
    /// measurements changed.
    pub async fn register_athlete(&self, athlete_id: AthleteId, anthropometry: Anthropometry) -> Result<CapacityRange> {
        {
            let athletes = self.athletes.read().await;
            if let Some(existing) = athletes.get(&athlete_id) {
                if existing.anthropometry == anthropometry {
                    return Ok(existing.capacity.clone());
                }
            }
        }

        let capacity = self.pipeline.capacity(&anthropometry)?;
        let profile = AthleteProfile {
            athlete_id,
            anthropometry,
            capacity: capacity.clone(),
            computed_at: Utc::now(),
        };

        let mut athletes = self.athletes.write().await;
        athletes.insert(athlete_id, profile);
        tracing::info!(
            "Registered athlete {:?}: capacity {:.1}-{:.1} mph",
            athlete_id,
            capacity.min,
            capacity.max
        );
        Ok(capacity)
    }

    pub async fn athlete(&self, athlete_id: AthleteId) -> Option<AthleteProfile> {
        let athletes = self.athletes.read().await;
        athletes.get(&athlete_id).cloned()
    }

    pub async fn capacity(&self, athlete_id: AthleteId) -> Option<CapacityRange> {
        let athletes = self.athletes.read().await;
        athletes.get(&athlete_id).map(|p| p.capacity.clone())
    }

    pub async fn remove_athlete(&self, athlete_id: AthleteId) -> Option<AthleteProfile> {
        let mut athletes = self.athletes.write().await;
        athletes.remove(&athlete_id)
    }

    pub async fn athlete_count(&self) -> usize {
        self.athletes.read().await.len()
    }

    /// Analyze one swing on the blocking pool
    pub async fn analyze_swing(&self, request: SwingRequest) -> Result<SwingReport> {
        let athlete = match request.athlete_id {
            Some(id) => Some(self.athlete(id).await.ok_or_else(|| {
                Error::InvalidInput(format!("athlete {:?} is not registered", id))
            })?),
            None => None,
        };

        let pipeline = self.pipeline.clone();
        let SwingRequest {
            swing_id,
            athlete_id,
            frames,
        } = request;

        let analysis = tokio::task::spawn_blocking(move || {
            let body = athlete.as_ref().map(|a| a.anthropometry);
            let capacity = athlete.map(|a| a.capacity);
            pipeline.analyze_with_capacity(&frames, body.as_ref(), capacity)
        })
        .await
        .map_err(|e| Error::InvariantViolation(format!("analysis task for swing {:?} failed: {}", swing_id, e)))??;

        Ok(SwingReport {
            swing_id,
            athlete_id,
            analyzed_at: Utc::now(),
            analysis,
        })
    }

    /// Analyze many swings concurrently; results keep request order
    pub async fn analyze_batch(&self, requests: Vec<SwingRequest>) -> Vec<Result<SwingReport>> {
        let count = requests.len();
        let results = join_all(requests.into_iter().map(|r| self.analyze_swing(r))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!("Batch complete: {} swings, {} failed", count, failed);
        results
    }
}

impl Default for AnalysisService {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swing_core::{Joint, Position3D, Timestamp};

    fn frames(count: u32) -> Vec<JointFrame> {
        (0..count)
            .map(|i| {
                let swing = i as f64 * 0.004;
                JointFrame::new(i, Timestamp::from_millis(i as f64 * 10.0))
                    .with_joint(Joint::LeftShoulder, Position3D::planar(0.45, 0.30 + swing), 0.9)
                    .with_joint(Joint::RightShoulder, Position3D::planar(0.55, 0.30 - swing), 0.9)
                    .with_joint(Joint::LeftHip, Position3D::planar(0.46, 0.55), 0.9)
                    .with_joint(Joint::RightHip, Position3D::planar(0.54, 0.55), 0.9)
                    .with_joint(Joint::RightElbow, Position3D::planar(0.60, 0.40), 0.9)
                    .with_joint(Joint::RightWrist, Position3D::planar(0.62 + swing, 0.48), 0.9)
            })
            .collect()
    }

    fn athlete() -> Anthropometry {
        Anthropometry::new(70.0, 185.0, 72.0, 17.0, 31.0)
    }

    #[tokio::test]
    async fn test_capacity_is_cached_per_athlete() {
        let service = AnalysisService::default();
        let id = AthleteId::new();

        let first = service.register_athlete(id, athlete()).await.unwrap();
        let computed_at = service.athlete(id).await.unwrap().computed_at;
        let again = service.register_athlete(id, athlete()).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(service.athlete(id).await.unwrap().computed_at, computed_at);
        assert_eq!(service.athlete_count().await, 1);

        let mut grown = athlete();
        grown.height_in = 72.0;
        let updated = service.register_athlete(id, grown).await.unwrap();
        assert_ne!(updated, first);
        assert_eq!(service.capacity(id).await, Some(updated));
    }

    #[tokio::test]
    async fn test_swing_against_registered_athlete() {
        let service = AnalysisService::default();
        let id = AthleteId::new();
        service.register_athlete(id, athlete()).await.unwrap();

        let report = service
            .analyze_swing(SwingRequest::new(frames(80)).for_athlete(id))
            .await
            .unwrap();

        assert_eq!(report.athlete_id, Some(id));
        assert!(report.analysis.gap.is_some());
        assert_eq!(report.analysis.capacity, service.capacity(id).await);
    }

    #[tokio::test]
    async fn test_unknown_athlete_is_rejected() {
        let service = AnalysisService::default();
        let result = service
            .analyze_swing(SwingRequest::new(frames(80)).for_athlete(AthleteId::new()))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_isolates_failures() {
        let service = AnalysisService::default();
        let requests = vec![
            SwingRequest::new(frames(80)),
            SwingRequest::new(frames(3)),
            SwingRequest::new(frames(60)),
        ];
        let ids: Vec<SwingId> = requests.iter().map(|r| r.swing_id).collect();

        let results = service.analyze_batch(requests).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().swing_id, ids[0]);
        assert!(results[1].as_ref().unwrap_err().is_insufficient_data());
        assert_eq!(results[2].as_ref().unwrap().swing_id, ids[2]);
    }
}
