#[cfg(test)]
pub mod common;


#[cfg(test)]
mod test_move_pipeline;


#[cfg(test)]
mod test_move_calling;

#[cfg(test)]
mod test_switching;

#[cfg(test)]
mod test_field;

#[cfg(test)]
mod test_replay;
