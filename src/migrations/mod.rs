use failure::{self, ResultExt};
use postgres::Client;

/// One SQL statement, with the message reported if it fails.
#[derive(Clone, Copy, Debug)]
pub struct Statement {
    pub context: &'static str,
    pub sql: &'static str,
}

/// Named schema change, made of statements executed in order.
#[derive(Clone, Copy, Debug)]
pub struct Migration {
    pub name: &'static str,
    pub statements: &'static [Statement],
}

pub const DROP_ORDERS: Statement = Statement {
    context: "error dropping table",
    sql: "DROP TABLE IF EXISTS orders CASCADE;",
};

pub const CREATE_ORDERS: Statement = Statement {
    context: "error creating table",
    sql: "
    CREATE TABLE orders (
        id         SERIAL PRIMARY KEY,
        symbol     VARCHAR(10) NOT NULL,
        price      DECIMAL(10,2) NOT NULL,
        quantity   INTEGER NOT NULL,
        order_type VARCHAR(4) NOT NULL,
        status     VARCHAR(20) NOT NULL DEFAULT 'PENDING',
        created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
    );
    ",
};

/// Discards the orders table and recreates it empty.
pub const ORDERS_RESET: Migration = Migration {
    name: "orders_reset",
    statements: &[DROP_ORDERS, CREATE_ORDERS],
};

pub const DEFAULT: &[Migration] = &[ORDERS_RESET];

/// Applies migrations in order inside a single transaction. Nothing is committed unless every statement succeeds.
pub fn run(client: &mut Client, migrations: &[Migration]) -> Result<(), failure::Error> {
    let mut tx = client.transaction().context("error starting transaction")?;

    for migration in migrations {
        debug!("Applying migration {}", migration.name);
        for statement in migration.statements {
            tx.batch_execute(statement.sql).context(statement.context)?;
        }
    }

    tx.commit().context("error committing transaction")?;

    Ok(())
}
