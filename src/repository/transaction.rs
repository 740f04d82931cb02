// ==========================================
// 仓库 MTO+MTS 补货规则 - 事务边界
// ==========================================
// 说明: 所有仓储共享同一个 Arc<Mutex<Connection>>,
//       在同一连接上 BEGIN/COMMIT 即可覆盖全部仓储写入
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn execute_control(conn: &Arc<Mutex<Connection>>, sql: &str) -> RepositoryResult<()> {
    let guard = conn
        .lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))?;
    guard
        .execute_batch(sql)
        .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
}

/// 在单个事务中执行 `f`
///
/// - `f` 返回 Ok: COMMIT
/// - `f` 返回 Err: ROLLBACK，原错误原样返回
///
/// 注意: `f` 内部不得持有连接锁跨越仓储调用
pub fn run_in_transaction<T, E, F>(conn: &Arc<Mutex<Connection>>, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<RepositoryError>,
{
    execute_control(conn, "BEGIN IMMEDIATE")?;

    match f() {
        Ok(value) => {
            execute_control(conn, "COMMIT")?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = execute_control(conn, "ROLLBACK") {
                tracing::warn!("事务回滚失败: {}", rollback_err);
            } else {
                tracing::debug!("事务已回滚");
            }
            Err(err)
        }
    }
}
