use crate::TestContext;

pub mod data;
pub mod factory;

impl TestContext {
    pub fn rules<'a>(&'a self) -> RuleFixtures<'a> {
        RuleFixtures { setup: self }
    }
}

pub struct RuleFixtures<'a> {
    pub setup: &'a TestContext,
}
