//! Tiered resolution: durable store, then live generation, then stale local cache.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::generation::{GeneratedBundle, GenerationRequest, MenuGenerator};
use crate::menu::MenuBundle;
use crate::store::{
    load_bundle, save_bundle, BundleKey, CacheEntry, DurableStore, LocalCache, RecordMeta,
};
use crate::types::{now_millis, UserId};

/// Which tier produced a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Durable,
    Generated,
    StaleLocal,
}

impl ResolutionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionSource::Durable => "durable",
            ResolutionSource::Generated => "generated",
            ResolutionSource::StaleLocal => "stale_local",
        }
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub bundle: MenuBundle,
    pub source: ResolutionSource,
    /// False when the bundle was generated under other preferences (or the
    /// durable bookkeeping is missing). Durable hits are served either way.
    pub preference_hash_matches: bool,
}

pub struct TieredResolver {
    durable: Arc<dyn DurableStore>,
    local: Arc<dyn LocalCache>,
    generator: Arc<dyn MenuGenerator>,
}

impl TieredResolver {
    pub fn new(
        durable: Arc<dyn DurableStore>,
        local: Arc<dyn LocalCache>,
        generator: Arc<dyn MenuGenerator>,
    ) -> Self {
        Self {
            durable,
            local,
            generator,
        }
    }

    pub fn durable(&self) -> &Arc<dyn DurableStore> {
        &self.durable
    }

    /// Resolve the bundle for `(user, request.date, request.meal_type)`.
    ///
    /// A durable hit never triggers generation. Generation failures fall back to the
    /// local tier regardless of preference staleness; when that is empty too the
    /// result is `CacheMiss` naming the generation error kind.
    pub async fn resolve(
        &self,
        user_id: &UserId,
        request: &GenerationRequest,
    ) -> Result<Resolution, ApiError> {
        let key = BundleKey::new(user_id.clone(), request.date, request.meal_type);

        match load_bundle(self.durable.as_ref(), &key) {
            Ok(Some(record)) => {
                let preference_hash_matches = record
                    .meta
                    .as_ref()
                    .map(|meta| meta.preference_hash == request.preference_hash)
                    .unwrap_or(false);
                if preference_hash_matches {
                    info!(key = %key, "Durable hit");
                } else {
                    info!(
                        key = %key,
                        stale_preferences = true,
                        "Durable hit generated under other preferences; serving as stored"
                    );
                }
                return Ok(Resolution {
                    bundle: record.bundle,
                    source: ResolutionSource::Durable,
                    preference_hash_matches,
                });
            }
            Ok(None) => debug!(key = %key, tier = "durable", "Tier miss"),
            Err(e) => warn!(key = %key, error = %e, "Durable read failed; treating as miss"),
        }

        let generation_error = match self.generator.generate(request).await {
            Ok(generated) => {
                self.persist(&key, request, &generated);
                return Ok(Resolution {
                    bundle: generated.bundle,
                    source: ResolutionSource::Generated,
                    preference_hash_matches: true,
                });
            }
            Err(e) if e.is_generation_failure() => e,
            Err(e) => return Err(e),
        };
        info!(
            key = %key,
            kind = %generation_error.kind(),
            error = %generation_error,
            "Generation failed; trying local tier"
        );

        match self.local.get(request.date, request.meal_type) {
            Ok(Some(entry)) => {
                warn!(
                    key = %key,
                    stored_at_ms = entry.stored_at_ms,
                    "Serving stale local entry after generation failure"
                );
                return Ok(Resolution {
                    preference_hash_matches: entry.preference_hash == request.preference_hash,
                    bundle: entry.bundle,
                    source: ResolutionSource::StaleLocal,
                });
            }
            Ok(None) => debug!(key = %key, tier = "local", "Tier miss"),
            Err(e) => warn!(key = %key, error = %e, "Local read failed; treating as miss"),
        }

        error!(
            key = %key,
            cause = %generation_error.kind(),
            "No tier produced a complete bundle"
        );
        Err(ApiError::CacheMiss {
            key: key.to_string(),
            cause: Some(generation_error.kind()),
        })
    }

    /// Write a fresh bundle to both tiers. Failures are logged, never returned.
    fn persist(&self, key: &BundleKey, request: &GenerationRequest, generated: &GeneratedBundle) {
        let now = now_millis();
        match generated.bundle.content_hash() {
            Ok(content_hash) => {
                match self.durable.find_by_content_hash(&content_hash) {
                    Ok(Some(existing)) if existing != *key => {
                        debug!(key = %key, duplicate_of = %existing, "Identical bundle already stored")
                    }
                    Ok(_) => {}
                    Err(e) => debug!(key = %key, error = %e, "Content index lookup failed"),
                }
                let meta = RecordMeta {
                    model: generated.model.clone(),
                    usage: generated.usage,
                    cost_usd: generated.cost_usd,
                    preference_hash: request.preference_hash,
                    created_at_ms: now,
                    content_hash,
                };
                if let Err(e) = save_bundle(self.durable.as_ref(), key, &generated.bundle, &meta) {
                    warn!(key = %key, error = %e, "Durable write failed");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "Could not hash bundle; skipping durable write"),
        }

        let entry = CacheEntry::new(generated.bundle.clone(), request.preference_hash, now);
        if let Err(e) = self.local.put(request.date, request.meal_type, &entry) {
            warn!(key = %key, error = %e, "Local write failed");
        }
    }
}
