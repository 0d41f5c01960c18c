mod test_emit;
mod test_leb128;
