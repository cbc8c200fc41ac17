mod failure_tests;
