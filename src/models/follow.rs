use serde::{Deserialize, Serialize};

/// 关注统计：粉丝数、关注数以及当前访问者是否已关注
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowStats {
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool,
}
