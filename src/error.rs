use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A stage name that is not defined in the environment.
    #[snafu(display("unknown function {name}"))]
    UnknownFunction { name: String },

    #[snafu(display("function {name} has {num_stages} stages, no stage {stage}"))]
    StageOutOfRange { name: String, stage: usize, num_stages: usize },

    /// A stage loop variable with no bound in the supplied region.
    #[snafu(display("no bound for variable {var} of function {func}"))]
    MissingBound { func: String, var: String },

    #[snafu(display("region for {func} has {actual} dimensions, expected {expected}"))]
    DimensionMismatch { func: String, expected: usize, actual: usize },

    /// A scheduling directive named a loop dimension the schedule does not have.
    #[snafu(display("no loop dimension named {var}"))]
    UnknownDim { var: String },

    /// Only functions without update definitions can be inlined.
    #[snafu(display("cannot inline {name}: it has update definitions"))]
    InlineUpdate { name: String },

    #[snafu(display("unknown input {name}"))]
    UnknownInput { name: String },
}
