/// An ordered sequence of customer identifiers with derived completion and
/// waiting time. Depot endpoints are implicit and never stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    pub customers: Vec<usize>,
    pub completion_time: f64,
    pub waiting_time: f64,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}
