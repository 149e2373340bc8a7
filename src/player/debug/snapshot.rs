/// Everything the UI needs while the VM is paused. Plain strings and
/// integers only: the snapshot crosses threads as an immutable value.
#[derive(Clone, Debug)]
pub struct DebugSnapshot {
    pub script_id: u16,
    pub script_name: String,
    pub handler_name: String,
    pub offset: usize,
    pub opcode: String,
    pub operand: i64,
    pub stack: Vec<String>,
    pub locals: Vec<(String, String)>,
    pub args: Vec<(String, String)>,
    pub globals: Vec<(String, String)>,
    pub receiver: Option<String>,
    pub call_stack: Vec<StackFrameInfo>,
    pub watches: Vec<WatchValue>,
}

#[derive(Clone, Debug)]
pub struct StackFrameInfo {
    pub script_id: u16,
    pub script_name: String,
    pub handler_name: String,
    pub args: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct WatchExpression {
    pub id: u32,
    pub expression: String,
}

#[derive(Clone, Debug)]
pub struct WatchValue {
    pub id: u32,
    pub expression: String,
    pub value: String,
    pub error: Option<String>,
}
