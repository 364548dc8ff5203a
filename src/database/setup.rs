use log::debug;

use super::connection::DbConn;
use super::store::StoreResult;

pub fn apply_schema(conn: &mut DbConn) -> StoreResult<()> {
    let schema_sql = include_str!("schema.sql");
    let statements = split_sql_statements(schema_sql);

    for statement in &statements {
        execute_sql(conn, statement)?;
    }

    debug!("Database schema applied ({} statements)", statements.len());
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn execute_sql(conn: &mut DbConn, sql: &str) -> StoreResult<()> {
    conn.execute(sql, [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons_and_drops_blanks() {
        let statements = split_sql_statements("CREATE TABLE a (x);\n\n CREATE INDEX i ON a (x);\n");
        assert_eq!(statements, vec!["CREATE TABLE a (x)", "CREATE INDEX i ON a (x)"]);
    }
}
