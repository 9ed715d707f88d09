use std::collections::{BTreeSet, VecDeque};

use crate::db_error::{Error, Result};
use crate::store::Database;
use crate::types::{ReferentialAction, Value};

/// 一次顶层删除解析出的执行计划。
///
/// 计划先算后用：遍历外键图收集所有将被删除的行、将被置空的引用
/// 与所有restrict阻塞，期间不做任何修改。只有在没有阻塞时，
/// Database才按计划提交副作用，保证被阻塞的删除零副作用。
#[derive(Debug, Default, PartialEq)]
pub(crate) struct DeletePlan {
    /// 计划删除的 (表名, 行id)，含顶层行本身，按发现顺序
    pub deletions: Vec<(String, String)>,
    /// 计划置空的 (表名, 行id, 列名)
    pub set_nulls: Vec<(String, String, String)>,
}

/// 解析删除 `table` 中行 `id` 的完整计划。
///
/// 用显式工作队列加已调度集合遍历级联闭包，自引用、互引用的
/// 外键环也能终止，每行至多调度一次。
pub(crate) fn plan_delete(db: &Database, table: &str, id: &str) -> Result<DeletePlan> {
    let origin = db.table(table)?;
    if origin.row(id).is_none() {
        return Err(Error::NotFound(format!("row {id} in table {}", origin.name)));
    }

    let mut plan = DeletePlan::default();
    let mut scheduled: BTreeSet<(String, String)> = BTreeSet::new();
    let mut queue: VecDeque<(String, String)> =
        VecDeque::from([(origin.name.clone(), id.to_string())]);
    // (阻塞表, 阻塞列, 阻塞行, 被引用表)
    let mut restricts: Vec<(String, String, String, String)> = Vec::new();

    while let Some((name, rid)) = queue.pop_front() {
        if !scheduled.insert((name.clone(), rid.clone())) {
            continue;
        }
        plan.deletions.push((name.clone(), rid.clone()));
        let Some(row) = db.table(&name)?.row(&rid) else { continue };
        for other in db.tables() {
            for fk in &other.schema.foreign_keys {
                if fk.referenced_table != name {
                    continue;
                }
                let Some(target) = row.get(&fk.referenced_column) else { continue };
                if *target == Value::Null {
                    continue;
                }
                for (rid2, row2) in &other.rows {
                    let value = row2.get(&fk.column).unwrap_or(&Value::Null);
                    if value != target {
                        continue;
                    }
                    match fk.on_delete {
                        ReferentialAction::Restrict => restricts.push((
                            other.name.clone(),
                            fk.column.clone(),
                            rid2.clone(),
                            name.clone(),
                        )),
                        ReferentialAction::Cascade => {
                            queue.push_back((other.name.clone(), rid2.clone()))
                        }
                        ReferentialAction::SetNull => {
                            let entry = (other.name.clone(), rid2.clone(), fk.column.clone());
                            if !plan.set_nulls.contains(&entry) {
                                plan.set_nulls.push(entry);
                            }
                        }
                    }
                }
            }
        }
    }

    // 级联闭包内的行不构成阻塞：它们在同一次删除中消失
    if let Some((bt, bc, br, target)) = restricts
        .into_iter()
        .find(|(bt, _, br, _)| !scheduled.contains(&(bt.clone(), br.clone())))
    {
        return Err(Error::Constraint(format!(
            "cannot delete from {target}: row {br} in {bt}.{bc} still references it"
        )));
    }
    // 同一计划内将被删除的行不需要再置空
    plan.set_nulls
        .retain(|(t, rid, _)| !scheduled.contains(&(t.clone(), rid.clone())));
    Ok(plan)
}
