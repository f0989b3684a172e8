use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheItem<T> {
    value: T,
    expires_at: Instant,
}

/// 简单的内存缓存实现，支持 TTL 和手动清空
#[derive(Debug, Clone)]
pub struct Cache<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<String, CacheItem<T>>>>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    /// 创建新的缓存实例，并在 tokio 运行时中启动过期清理任务
    pub fn new(default_ttl: Duration) -> Self {
        let cache = Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let data_ref = Arc::downgrade(&cache.data);
            let period = default_ttl.max(Duration::from_secs(60));
            handle.spawn(async move {
                loop {
                    sleep(period).await;
                    if !Self::cleanup_expired(&data_ref) {
                        break;
                    }
                }
            });
        }

        cache
    }

    /// 设置缓存项，使用默认 TTL
    pub fn set(&self, key: impl Into<String>, value: T) {
        let item = CacheItem {
            value,
            expires_at: Instant::now() + self.default_ttl,
        };
        self.data.write().insert(key.into(), item);
    }

    /// 获取未过期的缓存项
    pub fn get(&self, key: &str) -> Option<T> {
        let data = self.data.read();
        data.get(key)
            .filter(|item| item.expires_at > Instant::now())
            .map(|item| item.value.clone())
    }

    /// 删除缓存项
    pub fn delete(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// 清理过期项；缓存已被释放时返回 false
    fn cleanup_expired(data: &Weak<RwLock<HashMap<String, CacheItem<T>>>>) -> bool {
        match data.upgrade() {
            Some(data) => {
                let now = Instant::now();
                data.write().retain(|_, item| item.expires_at > now);
                true
            }
            None => false,
        }
    }
}

/// 页面缓存：键为路由 + 查询串（+ 访问者），值为渲染好的 HTML
pub type PageCache = Cache<String>;

/// 生成首页缓存键
pub fn index_page_key(viewer: Option<&str>, path_and_query: &str) -> String {
    match viewer {
        Some(username) => format!("index_page:user={}:{}", username, path_and_query),
        None => format!("index_page:anonymous:{}", path_and_query),
    }
}
