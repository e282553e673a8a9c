use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use async_trait::async_trait;
use log::{debug, error};
use redis::{AsyncCommands, Client as RedisClient, Script};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Snapshot families. Writes invalidate a whole scope, so every read keyed
/// under it refetches on its next call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    PageSeo,
    AllPageSeo,
    GlobalSeo,
    SitemapEntries,
    PageContent,
    SocialLinks,
    Inquiries,
    Media,
    ActivityLog,
    SiteSettings,
    UserRoles,
    Invitations,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::PageSeo => "seo-settings",
            Scope::AllPageSeo => "all-seo-settings",
            Scope::GlobalSeo => "global-seo-settings",
            Scope::SitemapEntries => "sitemap-entries",
            Scope::PageContent => "page-content",
            Scope::SocialLinks => "social-links",
            Scope::Inquiries => "contact-inquiries",
            Scope::Media => "media-files",
            Scope::ActivityLog => "activity-log",
            Scope::SiteSettings => "site-settings",
            Scope::UserRoles => "user-roles",
            Scope::Invitations => "user-invitations",
        }
    }

    fn redis_key(&self) -> String {
        format!("sitecms:{}", self.as_str())
    }

    fn generation_key(&self) -> String {
        format!("sitecms:{}:generation", self.as_str())
    }
}

#[async_trait]
pub trait Snapshots: Send + Sync {
    async fn load(&self, scope: Scope, id: &str) -> Option<String>;

    /// Counter bumped by every [`Snapshots::invalidate`] of `scope`.
    async fn generation(&self, scope: Scope) -> u64;

    /// Remember `payload` unless `scope` was invalidated since `generation`
    /// was read.
    async fn store(&self, scope: Scope, id: &str, payload: String, generation: u64);

    async fn invalidate(&self, scope: Scope);
}

/// Read-through helper: serve the cached snapshot when it decodes, otherwise
/// run `fetch` and remember its result. Fetch errors are never cached.
pub async fn cached<T, E, F, Fut>(
    cache: &dyn Snapshots,
    scope: Scope,
    id: &str,
    fetch: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(payload) = cache.load(scope, id).await {
        match serde_json::from_str::<T>(&payload) {
            Ok(value) => {
                debug!("Cache hit {}/{}", scope.as_str(), id);
                return Ok(value);
            }
            Err(error) => error!(
                "Drop undecodable snapshot {}/{}: {}",
                scope.as_str(),
                id,
                error
            ),
        }
    }

    debug!("Cache miss {}/{}", scope.as_str(), id);
    let generation = cache.generation(scope).await;
    let value = fetch().await?;

    if let Ok(payload) = serde_json::to_string(&value) {
        cache.store(scope, id, payload, generation).await;
    }
    Ok(value)
}

#[derive(Default)]
struct Scoped {
    generation: u64,
    snapshots: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemorySnapshots {
    entries: RwLock<HashMap<Scope, Scoped>>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, scope: Scope) -> usize {
        self.entries
            .read()
            .map(|entries| entries.get(&scope).map_or(0, |scoped| scoped.snapshots.len()))
            .unwrap_or(0)
    }
}

#[async_trait]
impl Snapshots for MemorySnapshots {
    async fn load(&self, scope: Scope, id: &str) -> Option<String> {
        self.entries
            .read()
            .ok()?
            .get(&scope)
            .and_then(|scoped| scoped.snapshots.get(id))
            .cloned()
    }

    async fn generation(&self, scope: Scope) -> u64 {
        self.entries
            .read()
            .map(|entries| entries.get(&scope).map_or(0, |scoped| scoped.generation))
            .unwrap_or(0)
    }

    async fn store(&self, scope: Scope, id: &str, payload: String, generation: u64) {
        match self.entries.write() {
            Ok(mut entries) => {
                let scoped = entries.entry(scope).or_default();

                if scoped.generation == generation {
                    scoped.snapshots.insert(id.to_string(), payload);
                } else {
                    debug!("Skip outdated snapshot {}/{}", scope.as_str(), id);
                }
            }
            Err(_) => error!("Failed to lock snapshot cache for {}", scope.as_str()),
        }
    }

    async fn invalidate(&self, scope: Scope) {
        match self.entries.write() {
            Ok(mut entries) => {
                let scoped = entries.entry(scope).or_default();

                scoped.generation += 1;
                scoped.snapshots.clear();
            }
            Err(_) => error!("Failed to lock snapshot cache for {}", scope.as_str()),
        }
    }
}

// KEYS: snapshot hash, generation counter. ARGV: generation, id, payload, ttl.
const STORE_IF_CURRENT: &str = r"
if tonumber(redis.call('GET', KEYS[2]) or '0') ~= tonumber(ARGV[1]) then
    return 0
end
redis.call('HSET', KEYS[1], ARGV[2], ARGV[3])
redis.call('EXPIRE', KEYS[1], ARGV[4])
return 1
";

/// One redis hash per scope, one field per snapshot id. Dropping the hash
/// invalidates the scope, and the generation counter keeps a slow read from
/// storing what it fetched before the drop.
pub struct RedisSnapshots {
    client: RedisClient,
    ttl: i64,
}

impl RedisSnapshots {
    pub fn new(client: RedisClient, ttl: i64) -> Self {
        Self { client, ttl }
    }

    pub async fn ping(&self) -> bool {
        match self.client.get_multiplexed_tokio_connection().await {
            Ok(mut conn) => match conn.ping::<String>().await {
                Ok(resp) => resp == "PONG",
                Err(_) => false,
            },
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Snapshots for RedisSnapshots {
    async fn load(&self, scope: Scope, id: &str) -> Option<String> {
        let mut conn = self.client.get_multiplexed_tokio_connection().await.ok()?;

        conn.hget::<_, _, Option<String>>(scope.redis_key(), id)
            .await
            .ok()
            .flatten()
    }

    async fn generation(&self, scope: Scope) -> u64 {
        let mut conn = match self.client.get_multiplexed_tokio_connection().await {
            Ok(conn) => conn,
            Err(_) => return 0,
        };

        conn.get::<_, Option<u64>>(scope.generation_key())
            .await
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    async fn store(&self, scope: Scope, id: &str, payload: String, generation: u64) {
        match self.client.get_multiplexed_tokio_connection().await {
            Ok(mut conn) => {
                let key = scope.redis_key();
                let script = Script::new(STORE_IF_CURRENT);
                let stored: redis::RedisResult<i64> = script
                    .key(&key)
                    .key(scope.generation_key())
                    .arg(generation)
                    .arg(id)
                    .arg(payload)
                    .arg(self.ttl)
                    .invoke_async(&mut conn)
                    .await;

                match stored {
                    Ok(0) => debug!("Skip outdated snapshot {}/{}", scope.as_str(), id),
                    Ok(_) => {}
                    Err(error) => error!("Failed to update cache {}: {}", key, error),
                }
            }
            Err(error) => error!("Failed to connect cache: {}", error),
        }
    }

    async fn invalidate(&self, scope: Scope) {
        match self.client.get_multiplexed_tokio_connection().await {
            Ok(mut conn) => {
                let dropped: redis::RedisResult<()> = redis::pipe()
                    .atomic()
                    .del(scope.redis_key())
                    .incr(scope.generation_key(), 1)
                    .query_async(&mut conn)
                    .await;

                if let Err(error) = dropped {
                    error!("Failed to invalidate cache {}: {}", scope.as_str(), error);
                }
            }
            Err(error) => error!("Failed to connect cache: {}", error),
        }
    }
}
