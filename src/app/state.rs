// ==========================================
// 宝石订单跟踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 约束: 同一进程内所有仓储/引擎共享一个数据库连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{InventoryApi, OrderApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::OrderLifecycleManager;
use crate::repository::{
    ActionLogRepository, DesignRepository, OrderRepository, PaperRepository, StoneRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,
    /// 订单API
    pub order_api: Arc<OrderApi>,
    /// 库存主数据API
    pub inventory_api: Arc<InventoryApi>,
    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
    /// 订单仓储（只读查询/统计）
    pub order_repo: Arc<OrderRepository>,
    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 初始化订单引擎
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;

        match read_schema_version(&conn) {
            Ok(Some(v)) if v == CURRENT_SCHEMA_VERSION => {}
            Ok(v) => tracing::warn!(
                "schema_version 不匹配: 期望={}, 实际={:?}",
                CURRENT_SCHEMA_VERSION,
                v
            ),
            Err(e) => tracing::warn!("读取 schema_version 失败(将继续启动): {}", e),
        }

        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let stone_repo = Arc::new(StoneRepository::new(conn.clone()));
        let paper_repo = Arc::new(PaperRepository::new(conn.clone()));
        let design_repo = Arc::new(DesignRepository::new(conn.clone()));
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let lifecycle = Arc::new(OrderLifecycleManager::new(conn.clone(), config_manager.clone()));

        // ==========================================
        // 创建API实例
        // ==========================================
        let order_api = Arc::new(OrderApi::new(lifecycle, action_log_repo.clone()));
        let inventory_api = Arc::new(InventoryApi::new(stone_repo, paper_repo, design_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            order_api,
            inventory_api,
            config_manager,
            order_repo,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级:
/// 1. 环境变量 GEM_ORDER_DB_PATH
/// 2. 用户数据目录/gem-order-tracker/gem_orders.db
/// 3. ./gem_orders.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("GEM_ORDER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./gem_orders.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("gem-order-tracker");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("gem_orders.db");
        }
    }

    path.to_string_lossy().to_string()
}
