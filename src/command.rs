// Non-SQL statements like .exit are called “meta-commands”.
#[derive(Debug, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Constants,
    BTree,
    Unrecognized,
}

impl MetaCommand {
    fn parse(input: &str) -> Option<MetaCommand> {
        match input {
            ".exit" => Some(MetaCommand::Exit),
            ".constants" => Some(MetaCommand::Constants),
            ".btree" => Some(MetaCommand::BTree),
            _ => {
                if input.starts_with('.') {
                    Some(MetaCommand::Unrecognized)
                } else {
                    None
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    Insert {
        id: i32,
        username: String,
        email: String,
    },
    Select,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PrepareError {
    SyntaxError,
    UnrecognizedStatement,
}

impl Statement {
    /// Tokenizes one input line into a statement. Column limits and id sign
    /// are left to the executor.
    pub fn prepare(input: &str) -> Result<Statement, PrepareError> {
        let mut tokens = input.split_whitespace();
        match tokens.next() {
            Some("insert") => {
                let (Some(id), Some(username), Some(email), None) =
                    (tokens.next(), tokens.next(), tokens.next(), tokens.next())
                else {
                    return Err(PrepareError::SyntaxError);
                };
                let id = id.parse::<i32>().map_err(|_| PrepareError::SyntaxError)?;
                Ok(Statement::Insert {
                    id,
                    username: username.to_string(),
                    email: email.to_string(),
                })
            }
            Some("select") => match tokens.next() {
                None => Ok(Statement::Select),
                Some(_) => Err(PrepareError::SyntaxError),
            },
            _ => Err(PrepareError::UnrecognizedStatement),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputType {
    Meta(MetaCommand),
    Statement(Result<Statement, PrepareError>),
}

impl InputType {
    pub fn parse(input: &str) -> InputType {
        if let Some(meta) = MetaCommand::parse(input) {
            InputType::Meta(meta)
        } else {
            InputType::Statement(Statement::prepare(input))
        }
    }
}
