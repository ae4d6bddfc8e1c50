use crate::{
    error::Result,
    sql::{
        engine::{Context, Engine},
        executor::ResultSet,
    },
};

pub mod generator;

type Assert<E> = Box<dyn Fn(&Context<E>) -> Result<()>>;
type Invoke<E> = Box<dyn FnOnce(&mut Context<E>) -> Result<ResultSet>>;

/// Executable form of one statement
///
/// `assert` checks preconditions and takes the locks the statement needs.
/// It may run more than once (at staging time and again at commit).
/// `invoke` performs the change and runs at most once.
pub struct Operation<E: Engine> {
    assert: Assert<E>,
    invoke: Invoke<E>,
}

impl<E: Engine> Operation<E> {
    pub fn new(
        assert: impl Fn(&Context<E>) -> Result<()> + 'static,
        invoke: impl FnOnce(&mut Context<E>) -> Result<ResultSet> + 'static,
    ) -> Self {
        Self {
            assert: Box::new(assert),
            invoke: Box::new(invoke),
        }
    }

    pub fn assert(&self, ctx: &Context<E>) -> Result<()> {
        (self.assert)(ctx)
    }

    /// Runs the operation and renders its result
    pub fn invoke(self, ctx: &mut Context<E>) -> Result<String> {
        Ok((self.invoke)(ctx)?.to_string())
    }
}
