use crate::models::{AlertTable, DeviceTable, EventLogTable, Table, TelemetryTable};

/// Orders table DDL so every table is created after the tables it references.
pub struct SchemaManager {
    tables: Vec<Box<dyn Table + Send + Sync>>,
}

impl SchemaManager {
    pub fn new(tables: Vec<Box<dyn Table + Send + Sync>>) -> Self {
        Self {
            tables: Self::resolve_order(tables),
        }
    }

    fn resolve_order(mut pending: Vec<Box<dyn Table + Send + Sync>>) -> Vec<Box<dyn Table + Send + Sync>> {
        let mut ordered: Vec<Box<dyn Table + Send + Sync>> = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready = pending.iter().position(|table| {
                table
                    .dependencies()
                    .iter()
                    .all(|dep| ordered.iter().any(|done| done.name() == *dep))
            });

            match ready {
                Some(index) => ordered.push(pending.remove(index)),
                None => {
                    let names: Vec<_> = pending.iter().map(|t| t.name()).collect();
                    panic!("Circular or unresolved table dependencies: {names:?}");
                }
            }
        }

        ordered
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(vec![
            Box::new(AlertTable),
            Box::new(TelemetryTable),
            Box::new(EventLogTable),
            Box::new(DeviceTable),
        ])
    }
}
