#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    table: RouteTable,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, table: RouteTable) -> Self {
        Self { name, group, table }
    }

    pub fn small(name: &'static str, table: RouteTable) -> Self {
        Self::new(name, TestGroup::Small, table)
    }

    pub fn normal(name: &'static str, table: RouteTable) -> Self {
        Self::new(name, TestGroup::Normal, table)
    }

    pub fn large(name: &'static str, table: RouteTable) -> Self {
        Self::new(name, TestGroup::Large, table)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

/// A set of `(method, pattern)` routes and the request path sent through them.
#[derive(Debug, Copy, Clone)]
pub struct RouteTable {
    routes: &'static [(&'static str, &'static str)],
    path: &'static str,
}

impl RouteTable {
    pub const fn new(routes: &'static [(&'static str, &'static str)], path: &'static str) -> Self {
        Self { routes, path }
    }

    pub fn routes(&self) -> &'static [(&'static str, &'static str)] {
        self.routes
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

/// Route table size class, used as the benchmark id prefix.
#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            TestGroup::Small => "small",
            TestGroup::Normal => "normal",
            TestGroup::Large => "large",
        }
    }
}
